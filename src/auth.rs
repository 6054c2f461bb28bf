use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::warn;

use crate::api::ApiClient;
use crate::error::{DeskError, DeskResult};
use crate::roles::Role;
use crate::session::{Credentials, Principal};
use crate::storage::{get_json, put_json, KeyValueStore, KEY_PASSWORD_OVERRIDES};

/// Checks credentials and produces the principal they belong to.
pub trait Authenticator {
    fn authenticate(&self, credentials: &Credentials) -> DeskResult<Principal>;

    fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new_password: &str,
    ) -> DeskResult<()>;
}

struct DemoAccount {
    id: &'static str,
    email: &'static str,
    display_name: &'static str,
    role: Role,
    password_sha256: &'static str,
    must_change_password: bool,
}

/// Demonstration accounts. A fixture for mock mode, not a security boundary.
const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        id: "usr-0001",
        email: "superadmin@school.edu",
        display_name: "Sam Okafor",
        role: Role::SuperAdmin,
        password_sha256: "4e4c56e4a15f89f05c2f4c72613da2a18c9665d4f0d6acce16415eb06f9be776",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0002",
        email: "admin@school.edu",
        display_name: "Alex Morgan",
        role: Role::Admin,
        password_sha256: "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0003",
        email: "registrar@school.edu",
        display_name: "Rita Delgado",
        role: Role::Registrar,
        password_sha256: "e62d4aac050d801ca012d4bf47071efa53beccbe78bbc73593a0cdfe6da8d8b7",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0004",
        email: "cashier@school.edu",
        display_name: "Chen Wei",
        role: Role::Cashier,
        password_sha256: "b4c94003c562bb0d89535eca77f07284fe560fd48a7cc1ed99f0a56263d616ba",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0005",
        email: "teacher@school.edu",
        display_name: "Tomas Lindqvist",
        role: Role::Teacher,
        password_sha256: "cde383eee8ee7a4400adf7a15f716f179a2eb97646b37e089eb8d6d04e663416",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0006",
        email: "librarian@school.edu",
        display_name: "Lena Fischer",
        role: Role::Librarian,
        password_sha256: "ab8e89c55367f55a2f933b8dc8a9994d61f997df2b402274eb943fa22d77394a",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0007",
        email: "student@school.edu",
        display_name: "Jordan Reyes",
        role: Role::Student,
        password_sha256: "703b0a3d6ad75b649a28adde7d83c6251da457549263bc7ff45ec709b0a8448b",
        must_change_password: false,
    },
    DemoAccount {
        id: "usr-0008",
        email: "newteacher@school.edu",
        display_name: "Noor Haddad",
        role: Role::Teacher,
        password_sha256: "a68349561396ec264a350847024a4521d00beaa3358660c2709a80f31c7acdd0",
        must_change_password: true,
    },
];

pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Authenticates against the demo table; changed passwords are kept as
/// digests in durable storage and win over the table.
pub struct MockAuthenticator<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> MockAuthenticator<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    fn overrides(&self) -> DeskResult<BTreeMap<String, String>> {
        match get_json::<BTreeMap<String, String>>(self.store, KEY_PASSWORD_OVERRIDES)? {
            None => Ok(BTreeMap::new()),
            Some(Ok(map)) => Ok(map),
            Some(Err(e)) => {
                warn!(error = %e, "ignoring unreadable password overrides");
                Ok(BTreeMap::new())
            }
        }
    }

    fn verify(&self, email: &str, password: &str) -> DeskResult<(&'static DemoAccount, bool)> {
        let Some(account) = DEMO_ACCOUNTS.iter().find(|a| a.email == email) else {
            return Err(DeskError::InvalidCredentials);
        };
        let overrides = self.overrides()?;
        let changed = overrides.get(email);
        let expected = changed.map(String::as_str).unwrap_or(account.password_sha256);
        if password_digest(password) != expected {
            return Err(DeskError::InvalidCredentials);
        }
        Ok((account, changed.is_some()))
    }
}

impl Authenticator for MockAuthenticator<'_> {
    fn authenticate(&self, credentials: &Credentials) -> DeskResult<Principal> {
        let email = credentials.normalized_email();
        let (account, changed) = self.verify(&email, &credentials.password)?;
        Ok(Principal {
            id: account.id.to_string(),
            display_name: account.display_name.to_string(),
            email: account.email.to_string(),
            role: account.role,
            avatar_ref: None,
            must_change_password: account.must_change_password && !changed,
        })
    }

    fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new_password: &str,
    ) -> DeskResult<()> {
        let email = principal.email.trim().to_ascii_lowercase();
        self.verify(&email, current)?;
        let mut overrides = self.overrides()?;
        overrides.insert(email, password_digest(new_password));
        put_json(self.store, KEY_PASSWORD_OVERRIDES, &overrides)?;
        Ok(())
    }
}

/// Authenticates against the real backend.
pub struct RemoteAuthenticator {
    client: ApiClient,
}

impl RemoteAuthenticator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl Authenticator for RemoteAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> DeskResult<Principal> {
        let body = json!({
            "email": credentials.normalized_email(),
            "password": credentials.password,
        });
        self.client
            .post::<_, Principal>("auth/login", &body)
            .map_err(|e| match e {
                DeskError::NotAuthenticated | DeskError::InvalidInput { .. } => {
                    DeskError::InvalidCredentials
                }
                other => other,
            })
    }

    fn change_password(
        &self,
        principal: &Principal,
        current: &str,
        new_password: &str,
    ) -> DeskResult<()> {
        let body = json!({
            "email": principal.email,
            "currentPassword": current,
            "newPassword": new_password,
        });
        self.client
            .post_no_content("auth/change-password", &body)
            .map_err(|e| match e {
                DeskError::NotAuthenticated => DeskError::InvalidCredentials,
                other => other,
            })
    }
}
