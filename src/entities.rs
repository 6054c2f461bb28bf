use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{DeskError, DeskResult};
use crate::roles::Role;
use crate::routes::Screen;

/// Entity families with a list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Students,
    Employees,
    Accounts,
    Enrollments,
    Books,
    Users,
}

impl EntityKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "students" | "student" => Some(Self::Students),
            "employees" | "employee" => Some(Self::Employees),
            "accounts" | "account" => Some(Self::Accounts),
            "enrollments" | "enrollment" => Some(Self::Enrollments),
            "books" | "book" | "library" => Some(Self::Books),
            "users" | "user" => Some(Self::Users),
            _ => None,
        }
    }

    /// REST collection name on the real backend.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Employees => "employees",
            Self::Accounts => "accounts",
            Self::Enrollments => "enrollments",
            Self::Books => "books",
            Self::Users => "users",
        }
    }

    /// Screen whose guard also protects the data.
    pub fn screen(self) -> Screen {
        match self {
            Self::Students => Screen::Students,
            Self::Employees => Screen::Employees,
            Self::Accounts => Screen::Accounts,
            Self::Enrollments => Screen::Enrollment,
            Self::Books => Screen::Library,
            Self::Users => Screen::Users,
        }
    }
}

/// Comparable projection of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Missing,
}

impl SortValue {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_lowercase())
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        s.map(Self::text).unwrap_or(Self::Missing)
    }

    /// Missing values sort after everything else in ascending order.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Greater,
            (_, Self::Missing) => Ordering::Less,
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

pub trait Entity: Clone + Serialize + DeserializeOwned {
    const KIND: EntityKind;
    const SORT_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    /// Display fields matched by the search box.
    fn search_fields(&self) -> Vec<&str>;
    fn sort_value(&self, field: &str) -> SortValue;

    fn validate(&self) -> DeskResult<()> {
        Ok(())
    }
}

fn require(value: &str, field: &str) -> DeskResult<()> {
    if value.trim().is_empty() {
        return Err(DeskError::invalid_input(field, "must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: String,
    pub student_no: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: u8,
    #[serde(default)]
    pub section: Option<String>,
    pub status: String,
    #[serde(default)]
    pub guardian: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Entity for Student {
    const KIND: EntityKind = EntityKind::Students;
    const SORT_FIELDS: &'static [&'static str] =
        &["studentNo", "lastName", "firstName", "gradeLevel", "section", "status"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut v = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.student_no.as_str(),
            self.status.as_str(),
        ];
        v.extend(self.section.as_deref());
        v
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "studentNo" => SortValue::text(&self.student_no),
            "lastName" => SortValue::text(&self.last_name),
            "firstName" => SortValue::text(&self.first_name),
            "gradeLevel" => SortValue::Number(f64::from(self.grade_level)),
            "section" => SortValue::opt_text(self.section.as_deref()),
            "status" => SortValue::text(&self.status),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.first_name, "firstName")?;
        require(&self.last_name, "lastName")?;
        require(&self.student_no, "studentNo")?;
        if !(1..=12).contains(&self.grade_level) {
            return Err(DeskError::invalid_input("gradeLevel", "must be in 1..=12"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: String,
    pub employee_no: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub position: String,
    pub status: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Entity for Employee {
    const KIND: EntityKind = EntityKind::Employees;
    const SORT_FIELDS: &'static [&'static str] =
        &["employeeNo", "lastName", "firstName", "department", "position", "status"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.employee_no.as_str(),
            self.department.as_str(),
            self.position.as_str(),
            self.status.as_str(),
        ]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "employeeNo" => SortValue::text(&self.employee_no),
            "lastName" => SortValue::text(&self.last_name),
            "firstName" => SortValue::text(&self.first_name),
            "department" => SortValue::text(&self.department),
            "position" => SortValue::text(&self.position),
            "status" => SortValue::text(&self.status),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.first_name, "firstName")?;
        require(&self.last_name, "lastName")?;
        require(&self.employee_no, "employeeNo")
    }
}

/// One fee ledger line for a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: String,
    pub reference: String,
    pub student_no: String,
    pub student_name: String,
    pub description: String,
    pub amount_due: f64,
    #[serde(default)]
    pub amount_paid: f64,
    pub status: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl Account {
    pub fn balance(&self) -> f64 {
        self.amount_due - self.amount_paid
    }
}

impl Entity for Account {
    const KIND: EntityKind = EntityKind::Accounts;
    const SORT_FIELDS: &'static [&'static str] = &[
        "reference",
        "studentName",
        "amountDue",
        "amountPaid",
        "balance",
        "status",
        "dueDate",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.reference.as_str(),
            self.student_no.as_str(),
            self.student_name.as_str(),
            self.description.as_str(),
            self.status.as_str(),
        ]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "reference" => SortValue::text(&self.reference),
            "studentName" => SortValue::text(&self.student_name),
            "amountDue" => SortValue::Number(self.amount_due),
            "amountPaid" => SortValue::Number(self.amount_paid),
            "balance" => SortValue::Number(self.balance()),
            "status" => SortValue::text(&self.status),
            "dueDate" => self
                .due_date
                .map(|d| SortValue::Text(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(SortValue::Missing),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.reference, "reference")?;
        require(&self.student_no, "studentNo")?;
        if !(self.amount_due.is_finite() && self.amount_due >= 0.0) {
            return Err(DeskError::invalid_input("amountDue", "must be a non-negative amount"));
        }
        if !(self.amount_paid.is_finite() && self.amount_paid >= 0.0) {
            return Err(DeskError::invalid_input("amountPaid", "must be a non-negative amount"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default)]
    pub id: String,
    pub student_no: String,
    pub student_name: String,
    pub school_year: String,
    pub grade_level: u8,
    #[serde(default)]
    pub section: Option<String>,
    pub status: String,
}

impl Entity for Enrollment {
    const KIND: EntityKind = EntityKind::Enrollments;
    const SORT_FIELDS: &'static [&'static str] =
        &["studentName", "studentNo", "schoolYear", "gradeLevel", "status"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut v = vec![
            self.student_name.as_str(),
            self.student_no.as_str(),
            self.school_year.as_str(),
            self.status.as_str(),
        ];
        v.extend(self.section.as_deref());
        v
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "studentName" => SortValue::text(&self.student_name),
            "studentNo" => SortValue::text(&self.student_no),
            "schoolYear" => SortValue::text(&self.school_year),
            "gradeLevel" => SortValue::Number(f64::from(self.grade_level)),
            "status" => SortValue::text(&self.status),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.student_no, "studentNo")?;
        require(&self.school_year, "schoolYear")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub id: String,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub copies_total: u32,
    pub copies_available: u32,
}

impl Book {
    pub fn status(&self) -> &'static str {
        if self.copies_available == 0 {
            "checkedOut"
        } else {
            "available"
        }
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Books;
    const SORT_FIELDS: &'static [&'static str] =
        &["title", "author", "category", "isbn", "copiesAvailable"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.author.as_str(),
            self.isbn.as_str(),
            self.category.as_str(),
            self.status(),
        ]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "title" => SortValue::text(&self.title),
            "author" => SortValue::text(&self.author),
            "category" => SortValue::text(&self.category),
            "isbn" => SortValue::text(&self.isbn),
            "copiesAvailable" => SortValue::Number(f64::from(self.copies_available)),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.title, "title")?;
        if self.copies_available > self.copies_total {
            return Err(DeskError::invalid_input(
                "copiesAvailable",
                "cannot exceed copiesTotal",
            ));
        }
        Ok(())
    }
}

/// A staff or student login as managed from the users screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    pub status: String,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::Users;
    const SORT_FIELDS: &'static [&'static str] = &["displayName", "email", "role", "status"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.display_name.as_str(),
            self.email.as_str(),
            self.role.as_str(),
            self.status.as_str(),
        ]
    }

    fn sort_value(&self, field: &str) -> SortValue {
        match field {
            "displayName" => SortValue::text(&self.display_name),
            "email" => SortValue::text(&self.email),
            "role" => SortValue::text(self.role.as_str()),
            "status" => SortValue::text(&self.status),
            _ => SortValue::Missing,
        }
    }

    fn validate(&self) -> DeskResult<()> {
        require(&self.display_name, "displayName")?;
        if !self.email.contains('@') {
            return Err(DeskError::invalid_input("email", "must be an email address"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sorts_last_and_text_is_case_folded() {
        assert_eq!(SortValue::text("b").compare(&SortValue::text("A")), Ordering::Greater);
        assert_eq!(SortValue::Missing.compare(&SortValue::text("z")), Ordering::Greater);
        assert_eq!(
            SortValue::Number(2.0).compare(&SortValue::Number(10.0)),
            Ordering::Less
        );
    }

    #[test]
    fn entity_kinds_map_to_guarded_screens() {
        assert_eq!(EntityKind::parse("Library"), Some(EntityKind::Books));
        assert_eq!(EntityKind::Books.screen(), Screen::Library);
        assert_eq!(EntityKind::Enrollments.resource(), "enrollments");
        assert_eq!(EntityKind::parse("parents"), None);
    }

    #[test]
    fn book_validation_checks_copies() {
        let b = Book {
            id: String::new(),
            isbn: "x".into(),
            title: "T".into(),
            author: "A".into(),
            category: "C".into(),
            copies_total: 1,
            copies_available: 2,
        };
        assert!(b.validate().is_err());
    }
}
