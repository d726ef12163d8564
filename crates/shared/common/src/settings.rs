//! Process-wide settings.
//!
//! Built once at boot from environment variables (and `.env`), never mutated
//! afterwards, and handed to the subsystems that need it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use domain::{PasswordPolicy, PasswordValidatorKind, MIN_PASSWORD_LENGTH};
use thiserror::Error;

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8000;

pub const DEFAULT_DB_NAME: &str = "plataforma_servicos";
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_INIT_COMMAND: &str = "SET sql_mode='STRICT_TRANS_TABLES'";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_INSTALLED_APPS: &str = "users,staticfiles";
pub const DEFAULT_MIDDLEWARE: &str = "security,common,clickjacking";
pub const DEFAULT_PASSWORD_VALIDATORS: &str =
    "user_attribute_similarity,minimum_length,common_password,numeric";

pub const DEFAULT_TEMPLATE_DIRS: &str = "frontend";
pub const DEFAULT_STATIC_URL: &str = "/static/";
pub const DEFAULT_STATICFILES_DIRS: &str = "frontend/assets";

pub const DEFAULT_LANGUAGE_CODE: &str = "pt-br";
pub const DEFAULT_TIME_ZONE: &str = "America/Sao_Paulo";

/// Only usable while `DEBUG` is on
const INSECURE_DEV_SECRET_KEY: &str = "insecure-dev-key-change-me-before-any-deployment";

// =============================================================================
// Errors
// =============================================================================

/// Malformed or missing setting. Startup aborts on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("{key}: invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// The environment variable at fault
    pub fn key(&self) -> &'static str {
        match self {
            ConfigError::Missing { key } | ConfigError::Invalid { key, .. } => key,
        }
    }
}

// =============================================================================
// Enumerated options
// =============================================================================

/// Relational engine behind the account store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Mysql,
    Sqlite,
}

impl FromStr for DatabaseEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(DatabaseEngine::Mysql),
            "sqlite" => Ok(DatabaseEngine::Sqlite),
            _ => Err("expected 'mysql' or 'sqlite'".to_string()),
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatabaseEngine::Mysql => "mysql",
            DatabaseEngine::Sqlite => "sqlite",
        })
    }
}

/// Request/response policies the HTTP host can chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MiddlewareKind {
    Security,
    Common,
    Clickjacking,
}

impl MiddlewareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MiddlewareKind::Security => "security",
            MiddlewareKind::Common => "common",
            MiddlewareKind::Clickjacking => "clickjacking",
        }
    }
}

impl FromStr for MiddlewareKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "security" => Ok(MiddlewareKind::Security),
            "common" => Ok(MiddlewareKind::Common),
            "clickjacking" => Ok(MiddlewareKind::Clickjacking),
            other => Err(format!("unknown middleware '{}'", other)),
        }
    }
}

/// Feature modules the HTTP host can mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstalledApp {
    Users,
    StaticFiles,
}

impl InstalledApp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstalledApp::Users => "users",
            InstalledApp::StaticFiles => "staticfiles",
        }
    }
}

impl FromStr for InstalledApp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(InstalledApp::Users),
            "staticfiles" => Ok(InstalledApp::StaticFiles),
            other => Err(format!("unknown app '{}'", other)),
        }
    }
}

/// Primary key column type for new tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoField {
    /// 64-bit auto-increment
    BigAuto,
}

impl FromStr for AutoField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "big_auto" => Ok(AutoField::BigAuto),
            _ => Err("only 'big_auto' is supported".to_string()),
        }
    }
}

// =============================================================================
// Setting groups
// =============================================================================

/// Connection parameters for the account store.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub engine: DatabaseEngine,
    /// Schema name for MySQL, file path (or `:memory:`) for SQLite
    pub name: String,
    pub user: String,
    password: String,
    pub host: String,
    pub port: u16,
    /// Executed on every new MySQL connection
    pub init_command: Option<String>,
    pub max_connections: u32,
    url_override: Option<String>,
}

impl DatabaseSettings {
    /// Private in-memory SQLite database, for tests and quick local runs.
    pub fn sqlite_memory() -> Self {
        Self {
            engine: DatabaseEngine::Sqlite,
            name: ":memory:".to_string(),
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: 0,
            init_command: None,
            max_connections: 1,
            url_override: None,
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// `DATABASE_URL`, when it was given explicitly
    pub fn url_override(&self) -> Option<&str> {
        self.url_override.as_deref()
    }

    pub fn is_memory(&self) -> bool {
        self.engine == DatabaseEngine::Sqlite && self.name == ":memory:"
    }

    /// Connection URL without credentials, for logs.
    pub fn display_url(&self) -> String {
        match self.engine {
            DatabaseEngine::Mysql => {
                format!("mysql://{}@{}:{}/{}", self.user, self.host, self.port, self.name)
            }
            DatabaseEngine::Sqlite if self.is_memory() => "sqlite::memory:".to_string(),
            DatabaseEngine::Sqlite => format!("sqlite://{}", self.name),
        }
    }

    /// SQLite connection URL (creates the file when missing).
    pub fn sqlite_url(&self) -> String {
        if let Some(url) = &self.url_override {
            return url.clone();
        }
        if self.is_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", self.name)
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("engine", &self.engine)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("init_command", &self.init_command)
            .field("max_connections", &self.max_connections)
            .field("url_override", &self.url_override.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
    pub dirs: Vec<PathBuf>,
    /// Also search each installed app's own `templates/` directory
    pub app_dirs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSettings {
    /// URL prefix, always with leading and trailing slash
    pub url: String,
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    pub language_code: String,
    pub time_zone: String,
    pub use_i18n: bool,
    pub use_tz: bool,
}

// =============================================================================
// Settings
// =============================================================================

/// Application settings
#[derive(Clone)]
pub struct Settings {
    secret_key: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,
    pub installed_apps: Vec<InstalledApp>,
    pub middleware: Vec<MiddlewareKind>,
    pub templates: TemplateSettings,
    pub static_files: StaticSettings,
    pub database: DatabaseSettings,
    pub password_validators: Vec<PasswordValidatorKind>,
    pub password_min_length: usize,
    pub locale: LocaleSettings,
    pub default_auto_field: AutoField,
    pub server_host: String,
    pub server_port: u16,
    pub project_root: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("secret_key", &"[REDACTED]")
            .field("debug", &self.debug)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("installed_apps", &self.installed_apps)
            .field("middleware", &self.middleware)
            .field("templates", &self.templates)
            .field("static_files", &self.static_files)
            .field("database", &self.database)
            .field("password_validators", &self.password_validators)
            .field("password_min_length", &self.password_min_length)
            .field("locale", &self.locale)
            .field("default_auto_field", &self.default_auto_field)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("project_root", &self.project_root)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment, after reading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let debug = env.bool("DEBUG", true)?;

        let secret_key = match env.string("SECRET_KEY") {
            Some(key) => key,
            None if debug => INSECURE_DEV_SECRET_KEY.to_string(),
            None => return Err(ConfigError::Missing { key: "SECRET_KEY" }),
        };

        let project_root = env
            .string("PROJECT_ROOT")
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let static_url = env.or("STATIC_URL", DEFAULT_STATIC_URL);
        if !(static_url.starts_with('/') && static_url.ends_with('/')) {
            return Err(ConfigError::invalid(
                "STATIC_URL",
                &static_url,
                "must start and end with '/'",
            ));
        }

        let password_min_length = env.parse("PASSWORD_MIN_LENGTH", MIN_PASSWORD_LENGTH)?;
        if password_min_length == 0 {
            return Err(ConfigError::invalid(
                "PASSWORD_MIN_LENGTH",
                "0",
                "must be at least 1",
            ));
        }

        Ok(Self {
            secret_key,
            debug,
            allowed_hosts: list(&env.or("ALLOWED_HOSTS", "")),
            installed_apps: env.choices("INSTALLED_APPS", DEFAULT_INSTALLED_APPS)?,
            middleware: env.choices("MIDDLEWARE", DEFAULT_MIDDLEWARE)?,
            templates: TemplateSettings {
                dirs: resolve_all(&project_root, &env.or("TEMPLATE_DIRS", DEFAULT_TEMPLATE_DIRS)),
                app_dirs: env.bool("TEMPLATE_APP_DIRS", true)?,
            },
            static_files: StaticSettings {
                url: static_url,
                dirs: resolve_all(
                    &project_root,
                    &env.or("STATICFILES_DIRS", DEFAULT_STATICFILES_DIRS),
                ),
            },
            database: database_settings(&env)?,
            password_validators: env.choices("PASSWORD_VALIDATORS", DEFAULT_PASSWORD_VALIDATORS)?,
            password_min_length,
            locale: LocaleSettings {
                language_code: env.or("LANGUAGE_CODE", DEFAULT_LANGUAGE_CODE),
                time_zone: env.or("TIME_ZONE", DEFAULT_TIME_ZONE),
                use_i18n: env.bool("USE_I18N", true)?,
                use_tz: env.bool("USE_TZ", true)?,
            },
            default_auto_field: env.parse("DEFAULT_AUTO_FIELD", AutoField::BigAuto)?,
            server_host: env.or("SERVER_HOST", DEFAULT_SERVER_HOST),
            server_port: env.parse("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            project_root,
        })
    }

    /// Settings for tests: debug on, in-memory SQLite, default everything else.
    pub fn for_tests() -> Self {
        Self {
            secret_key: "test-secret-key".to_string(),
            debug: true,
            allowed_hosts: Vec::new(),
            installed_apps: vec![InstalledApp::Users, InstalledApp::StaticFiles],
            middleware: vec![
                MiddlewareKind::Security,
                MiddlewareKind::Common,
                MiddlewareKind::Clickjacking,
            ],
            templates: TemplateSettings {
                dirs: vec![PathBuf::from(DEFAULT_TEMPLATE_DIRS)],
                app_dirs: true,
            },
            static_files: StaticSettings {
                url: DEFAULT_STATIC_URL.to_string(),
                dirs: vec![PathBuf::from(DEFAULT_STATICFILES_DIRS)],
            },
            database: DatabaseSettings::sqlite_memory(),
            password_validators: PasswordValidatorKind::all().to_vec(),
            password_min_length: MIN_PASSWORD_LENGTH,
            locale: LocaleSettings {
                language_code: DEFAULT_LANGUAGE_CODE.to_string(),
                time_zone: DEFAULT_TIME_ZONE.to_string(),
                use_i18n: true,
                use_tz: true,
            },
            default_auto_field: AutoField::BigAuto,
            server_host: "127.0.0.1".to_string(),
            server_port: DEFAULT_SERVER_PORT,
            project_root: PathBuf::from("."),
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// True when running on the development fallback key.
    pub fn uses_insecure_secret_key(&self) -> bool {
        self.secret_key == INSECURE_DEV_SECRET_KEY
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn is_installed(&self, app: InstalledApp) -> bool {
        self.installed_apps.contains(&app)
    }

    /// Ordered password validators as a runnable policy.
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::from_kinds(&self.password_validators, self.password_min_length)
    }
}

fn database_settings(env: &Env<'_>) -> Result<DatabaseSettings, ConfigError> {
    let url_override = env.string("DATABASE_URL");

    let engine = match (env.string("DB_ENGINE"), url_override.as_deref()) {
        (Some(engine), _) => engine
            .parse::<DatabaseEngine>()
            .map_err(|reason: String| ConfigError::invalid("DB_ENGINE", &engine, reason))?,
        (None, Some(url)) if url.starts_with("sqlite:") => DatabaseEngine::Sqlite,
        (None, Some(url)) if url.starts_with("mysql:") => DatabaseEngine::Mysql,
        (None, Some(url)) => {
            return Err(ConfigError::invalid(
                "DATABASE_URL",
                url,
                "scheme must be mysql or sqlite",
            ))
        }
        (None, None) => DatabaseEngine::Mysql,
    };

    let name = env.or("DB_NAME", DEFAULT_DB_NAME);
    let init_command = match engine {
        DatabaseEngine::Mysql => Some(env.or("DB_INIT_COMMAND", DEFAULT_DB_INIT_COMMAND)),
        DatabaseEngine::Sqlite => None,
    };

    let max_connections = env.parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
    if max_connections == 0 {
        return Err(ConfigError::invalid(
            "DB_MAX_CONNECTIONS",
            "0",
            "must be at least 1",
        ));
    }

    Ok(DatabaseSettings {
        engine,
        name,
        user: env.or("DB_USER", DEFAULT_DB_USER),
        password: env.lookup("DB_PASSWORD").unwrap_or_default(),
        host: env.or("DB_HOST", DEFAULT_DB_HOST),
        port: env.parse("DB_PORT", DEFAULT_DB_PORT)?,
        init_command,
        max_connections,
        url_override,
    })
}

/// Typed accessors over a key lookup.
struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Non-blank trimmed value
    fn string(&self, key: &str) -> Option<String> {
        self.lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.string(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, &raw, e.to_string())),
            None => Ok(default),
        }
    }

    fn bool(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.string(key) {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid(key, &raw, "expected a boolean")),
            },
            None => Ok(default),
        }
    }

    /// Ordered list of enumerated names
    fn choices<T>(&self, key: &'static str, default: &str) -> Result<Vec<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.lookup(key).unwrap_or_else(|| default.to_string());
        list(&raw)
            .into_iter()
            .map(|item| {
                item.parse()
                    .map_err(|e: T::Err| ConfigError::invalid(key, &item, e.to_string()))
            })
            .collect()
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolve_all(root: &Path, raw: &str) -> Vec<PathBuf> {
    list(raw)
        .into_iter()
        .map(|dir| {
            let path = PathBuf::from(dir);
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        })
        .collect()
}
