//! Connection credentials
//!
//! Credentials live in a pipe-delimited file loaded once at start-up:
//!
//! ```text
//! name|product|host|port|user|password|database|local_environment
//! source|oracle|10.0.0.42|1521|BILLING|secret|ORCLPDB|/opt/oracle/instantclient
//! ```
//!
//! The list is passed to whoever needs a connection; duplicate detection is a
//! pure pass over it.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::parser::{DelimitedTable, ParseError, DEFAULT_DELIMITER};
use crate::product::{Product, ProductError};

/// File name looked up in the config directory when no path is given
pub const CREDENTIAL_FILE: &str = "credential.csv";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to read credential file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Line {line}: {source}")]
    InvalidProduct { line: usize, source: ProductError },

    #[error("Credential file is empty, add at least one connection")]
    Empty,

    #[error("Credential name used more than once: {0}")]
    DuplicateName(String),

    #[error("Duplicate credentials, keep one of each group: {}", format_groups(.groups))]
    Duplicates { groups: Vec<Vec<String>> },
}

fn format_groups(groups: &[Vec<String>]) -> String {
    groups
        .iter()
        .map(|g| format!("[{}]", g.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub product: Product,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
    /// Database name, Oracle service name, or SQLite file path
    pub database: String,
    /// Client library directory some drivers need (Oracle instant client)
    pub local_environment: Option<String>,
}

impl Credential {
    pub fn new(
        name: impl Into<String>,
        product: Product,
        host: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            product,
            host: host.into(),
            port: port.into(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            local_environment: None,
        }
    }

    pub fn with_login(self, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            ..self
        }
    }

    pub fn with_database(self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self
        }
    }

    pub fn with_local_environment(self, path: impl Into<String>) -> Self {
        Self {
            local_environment: Some(path.into()),
            ..self
        }
    }

    pub fn connection_url(&self) -> String {
        self.product.adapter().connection_url(self)
    }

    /// Connection URL safe to print
    pub fn masked_url(&self) -> String {
        if self.password.is_empty() {
            return self.connection_url();
        }
        let masked = Self {
            password: "***".to_string(),
            ..self.clone()
        };
        // The adapter would percent-encode the stars
        masked.connection_url().replace("%2A%2A%2A", "***")
    }

    /// Everything except the name; equal identities are duplicates
    fn identity(&self) -> (Product, &str, &str, &str, &str, &str, Option<&str>) {
        (
            self.product,
            self.host.as_str(),
            self.port.as_str(),
            self.user.as_str(),
            self.password.as_str(),
            self.database.as_str(),
            self.local_environment.as_deref(),
        )
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: product = {}, local environment path = {} -> {}@{}:{}/{}",
            self.name,
            self.product,
            self.local_environment.as_deref().unwrap_or("-"),
            self.user,
            self.host,
            self.port,
            self.database
        )
    }
}

/// All configured connections, in file order
#[derive(Debug, Clone, Default)]
pub struct CredentialList {
    credentials: Vec<Credential>,
}

impl CredentialList {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// `<config dir>/schema-leveler/credential.csv`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "schema-leveler")
            .map(|dirs| dirs.config_dir().join(CREDENTIAL_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let file = File::open(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::read(BufReader::new(file))?;

        tracing::debug!(path = %path.display(), count = list.len(), "Loaded credentials");
        Ok(list)
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self, CredentialError> {
        let table = DelimitedTable::read(reader, DEFAULT_DELIMITER)?;
        let name_idx = table.require(&["name"])?;
        let product_idx = table.require(&["product"])?;
        let database_idx = table.require(&["database"])?;
        let host_idx = table.column(&["host"]);
        let port_idx = table.column(&["port"]);
        let user_idx = table.column(&["user"]);
        let password_idx = table.column(&["password"]);
        let env_idx = table.column(&["local_environment"]);

        let mut credentials = Vec::with_capacity(table.rows().len());
        for row in table.rows() {
            let product = row
                .get(product_idx, "product")?
                .parse::<Product>()
                .map_err(|source| CredentialError::InvalidProduct {
                    line: row.line,
                    source,
                })?;

            credentials.push(Credential {
                name: row.get(name_idx, "name")?.to_string(),
                product,
                host: row.optional(host_idx).unwrap_or_default(),
                port: row.optional(port_idx).unwrap_or_default(),
                user: row.optional(user_idx).unwrap_or_default(),
                // Passwords may legitimately start or end with spaces
                password: password_idx
                    .and_then(|i| row.fields.get(i))
                    .cloned()
                    .unwrap_or_default(),
                database: row.get(database_idx, "database")?.to_string(),
                local_environment: row.optional(env_idx),
            });
        }

        Ok(Self { credentials })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.name == name)
    }

    /// Names of credentials that point at the same connection
    ///
    /// Only groups with more than one member are returned, ordered by the
    /// first appearance of each group.
    pub fn duplicate_groups(&self) -> Vec<Vec<&str>> {
        let mut index: HashMap<_, usize> = HashMap::new();
        let mut groups: Vec<Vec<&str>> = Vec::new();

        for credential in &self.credentials {
            match index.get(&credential.identity()) {
                Some(&i) => groups[i].push(credential.name.as_str()),
                None => {
                    index.insert(credential.identity(), groups.len());
                    groups.push(vec![credential.name.as_str()]);
                }
            }
        }

        groups.retain(|g| g.len() > 1);
        groups
    }

    /// Reject empty lists, reused names and duplicate connections
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.credentials.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut seen = std::collections::HashSet::new();
        for credential in &self.credentials {
            if !seen.insert(credential.name.as_str()) {
                return Err(CredentialError::DuplicateName(credential.name.clone()));
            }
        }

        let groups = self.duplicate_groups();
        if !groups.is_empty() {
            return Err(CredentialError::Duplicates {
                groups: groups
                    .into_iter()
                    .map(|g| g.into_iter().map(str::to_string).collect())
                    .collect(),
            });
        }

        Ok(())
    }
}
