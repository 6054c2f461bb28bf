use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::DaemonConfig;
use crate::datasource::{DataSourceSwitch, HealthProbe};
use crate::entities::{Account, Book, Employee, Enrollment, Entity, Student, User};
use crate::fixtures;
use crate::list::ListController;
use crate::repository::MemoryRepository;
use crate::session::SessionStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// List state plus the mock-mode records for one entity family.
pub struct EntityDesk<T> {
    pub list: ListController<T>,
    pub fixtures: MemoryRepository<T>,
}

impl<T: Entity> EntityDesk<T> {
    fn new(config: &DaemonConfig, seed: Vec<T>) -> Self {
        Self {
            list: ListController::new(config.page_size),
            fixtures: MemoryRepository::new(seed).with_latency(config.mock_latency),
        }
    }
}

pub struct Desks {
    pub students: EntityDesk<Student>,
    pub employees: EntityDesk<Employee>,
    pub accounts: EntityDesk<Account>,
    pub enrollments: EntityDesk<Enrollment>,
    pub books: EntityDesk<Book>,
    pub users: EntityDesk<User>,
}

impl Desks {
    pub fn new(config: &DaemonConfig) -> Self {
        Self {
            students: EntityDesk::new(config, fixtures::students()),
            employees: EntityDesk::new(config, fixtures::employees()),
            accounts: EntityDesk::new(config, fixtures::accounts()),
            enrollments: EntityDesk::new(config, fixtures::enrollments()),
            books: EntityDesk::new(config, fixtures::books()),
            users: EntityDesk::new(config, fixtures::users()),
        }
    }

    /// Drops loaded rows and view state; mock records are kept.
    pub fn reset_lists(&mut self) {
        self.students.list.reset();
        self.employees.list.reset();
        self.accounts.list.reset();
        self.enrollments.list.reset();
        self.books.list.reset();
        self.users.list.reset();
    }
}

pub struct AppState {
    pub config: DaemonConfig,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: SessionStore,
    pub data_source: DataSourceSwitch,
    pub desks: Desks,
}

impl AppState {
    pub fn new(config: DaemonConfig, probe: Box<dyn HealthProbe>) -> Self {
        let desks = Desks::new(&config);
        let data_source = DataSourceSwitch::new(probe).with_http_timeout(config.http_timeout);
        Self {
            config,
            workspace: None,
            db: None,
            session: SessionStore::new(),
            data_source,
            desks,
        }
    }
}
