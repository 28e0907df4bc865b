use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::identity::models::LoginHandle;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::RoleModel;
use crate::domain::identity::models::RoleName;
use crate::domain::identity::models::SignupCommand;
use crate::domain::identity::provisioning::ProvisioningPlan;
use crate::domain::identity::service::RolePolicy;
use crate::inbound::http::router::RouteRoles;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub roles: RoleConfig,
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

/// Without a url the service keeps identities in memory.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Longest token lifetime accepted from configuration: 365 days.
pub const MAX_EXPIRATION_MS: i64 = 365 * 24 * 60 * 60 * 1000;

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_ms: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordAlgorithm {
    Bcrypt,
    Argon2,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    #[serde(default = "default_password_algorithm")]
    pub algorithm: PasswordAlgorithm,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoleConfig {
    #[serde(default)]
    pub model: RoleModel,
    #[serde(default = "default_role")]
    pub default_role: String,
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    #[serde(default = "default_directory_roles")]
    pub directory_roles: Vec<String>,
    #[serde(default = "default_seed_roles")]
    pub seed: Vec<SeedRole>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SeedRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct BootstrapConfig {
    pub admin_handle: String,
    pub admin_password: String,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if self.jwt.expiration_ms <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_ms must be positive".to_string(),
            ));
        }
        if self.jwt.expiration_ms > MAX_EXPIRATION_MS {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_ms must not exceed {}",
                MAX_EXPIRATION_MS
            )));
        }
        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.admin_password.is_empty() {
                return Err(ConfigError::Message(
                    "bootstrap.admin_password must not be empty".to_string(),
                ));
            }
        }
        self.role_policy()?;
        self.route_roles()?;
        self.provisioning_plan()?;
        Ok(())
    }

    /// Role names handed to the identity service.
    pub fn role_policy(&self) -> Result<RolePolicy, ConfigError> {
        Ok(RolePolicy {
            model: self.roles.model,
            default_role: role_name(&self.roles.default_role)?,
            admin_role: role_name(&self.roles.admin_role)?,
        })
    }

    /// Role names the HTTP routes are guarded with.
    pub fn route_roles(&self) -> Result<RouteRoles, ConfigError> {
        let directory = self
            .roles
            .directory_roles
            .iter()
            .map(|name| role_name(name).map(|name| name.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RouteRoles {
            admin: role_name(&self.roles.admin_role)?.to_string(),
            directory,
        })
    }

    /// Roles and bootstrap administrator to ensure at startup.
    pub fn provisioning_plan(&self) -> Result<ProvisioningPlan, ConfigError> {
        let seed = self
            .roles
            .seed
            .iter()
            .map(|seed| Ok(Role::new(role_name(&seed.name)?, seed.description.clone())))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let policy = self.role_policy()?;

        let administrator = match &self.bootstrap {
            Some(bootstrap) => {
                let handle = LoginHandle::new(bootstrap.admin_handle.clone()).map_err(|e| {
                    ConfigError::Message(format!("bootstrap.admin_handle: {}", e))
                })?;
                let password = Password::new(bootstrap.admin_password.clone()).map_err(|e| {
                    ConfigError::Message(format!("bootstrap.admin_password: {}", e))
                })?;
                Some(SignupCommand::new(handle, password, None))
            }
            None => None,
        };

        Ok(ProvisioningPlan {
            seed,
            required: vec![policy.default_role, policy.admin_role],
            administrator,
        })
    }
}

fn role_name(name: &str) -> Result<RoleName, ConfigError> {
    RoleName::new(name).map_err(|e| ConfigError::Message(format!("role '{}': {}", name, e)))
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: default_password_algorithm(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            model: RoleModel::default(),
            default_role: default_role(),
            admin_role: default_admin_role(),
            directory_roles: default_directory_roles(),
            seed: default_seed_roles(),
        }
    }
}

impl PasswordConfig {
    pub fn hasher(&self) -> auth::PasswordHasher {
        match self.algorithm {
            PasswordAlgorithm::Bcrypt => auth::PasswordHasher::bcrypt(self.bcrypt_cost),
            PasswordAlgorithm::Argon2 => auth::PasswordHasher::argon2(),
        }
    }
}

// Secrets stay out of Debug output
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_ms", &self.expiration_ms)
            .finish()
    }
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_handle", &self.admin_handle)
            .field("admin_password", &"<redacted>")
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_password_algorithm() -> PasswordAlgorithm {
    PasswordAlgorithm::Bcrypt
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_role() -> String {
    "SPECTATOR".to_string()
}

fn default_admin_role() -> String {
    "ADMIN".to_string()
}

fn default_directory_roles() -> Vec<String> {
    vec!["ADMIN".to_string(), "COMMISSIONER".to_string()]
}

fn default_seed_roles() -> Vec<SeedRole> {
    [
        ("SPECTATOR", "Default user role"),
        ("VOLUNTEER", "Volunteer role"),
        ("COMMISSIONER", "Commissioner role"),
        ("ADMIN", "Administrator role"),
    ]
    .into_iter()
    .map(|(name, description)| SeedRole {
        name: name.to_string(),
        description: Some(description.to_string()),
    })
    .collect()
}
