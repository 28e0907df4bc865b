use std::collections::BTreeSet;
use std::sync::Arc;

use auth::Authenticator;
use auth::JwtHandler;
use auth::PasswordHasher;
use chrono::Duration;
use chrono::Utc;
use identity_service::domain::identity::models::Identity;
use identity_service::domain::identity::models::IdentityId;
use identity_service::domain::identity::models::LoginHandle;
use identity_service::domain::identity::models::Role;
use identity_service::domain::identity::models::RoleAssignment;
use identity_service::domain::identity::models::RoleModel;
use identity_service::domain::identity::models::RoleName;
use identity_service::domain::identity::ports::IdentityRepository;
use identity_service::domain::identity::provisioning::provision;
use identity_service::domain::identity::provisioning::ProvisioningPlan;
use identity_service::domain::identity::service::IdentityService;
use identity_service::domain::identity::service::RolePolicy;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::RouteRoles;
use identity_service::outbound::repositories::InMemoryIdentityRepository;
use identity_service::outbound::repositories::InMemoryRoleRepository;

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const PASSWORD: &str = "pass_word!";

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub identities: Arc<InMemoryIdentityRepository>,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let identities = Arc::new(InMemoryIdentityRepository::new());
        let roles = Arc::new(InMemoryRoleRepository::new());

        let authenticator = Arc::new(
            Authenticator::with_hasher(JWT_SECRET, Duration::hours(1), PasswordHasher::bcrypt(4))
                .expect("Failed to create authenticator"),
        );

        let identity_service = Arc::new(IdentityService::new(
            Arc::clone(&identities),
            Arc::clone(&roles),
            Arc::clone(&authenticator),
            RolePolicy {
                model: RoleModel::Single,
                default_role: role("SPECTATOR"),
                admin_role: role("ADMIN"),
            },
        ));

        let plan = ProvisioningPlan {
            seed: ["SPECTATOR", "VOLUNTEER", "COMMISSIONER", "ADMIN"]
                .into_iter()
                .map(|name| Role::new(role(name), None))
                .collect(),
            required: vec![role("SPECTATOR"), role("ADMIN")],
            administrator: None,
        };
        provision(roles.as_ref(), identity_service.as_ref(), plan)
            .await
            .expect("Failed to provision roles");

        let router = create_router(identity_service, authenticator, RouteRoles::default());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            identities,
            jwt_handler: JwtHandler::from_secret(JWT_SECRET).expect("Failed to create JWT handler"),
        }
    }

    /// Store an identity holding `roles` directly, bypassing signup
    pub async fn create_identity(&self, handle: &str, roles: &[&str]) -> Identity {
        let roles = match roles {
            [single] => RoleAssignment::Single(role(single)),
            many => RoleAssignment::Multiple(
                many.iter().map(|name| role(name)).collect::<BTreeSet<_>>(),
            ),
        };

        self.identities
            .create(Identity {
                id: IdentityId::new(),
                handle: LoginHandle::new(handle.to_string()).unwrap(),
                password_hash: PasswordHasher::bcrypt(4).hash(PASSWORD).unwrap(),
                display_name: None,
                roles,
                enabled: true,
                created_at: Utc::now(),
                last_login: None,
            })
            .await
            .expect("Failed to store identity")
    }

    /// Log in through the API and return the bearer token
    pub async fn login(&self, handle: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&serde_json::json!({ "handle": handle, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    /// Create an identity with `roles` and log it in
    pub async fn token_for(&self, handle: &str, roles: &[&str]) -> String {
        self.create_identity(handle, roles).await;
        self.login(handle, PASSWORD).await
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }
}

pub fn role(name: &str) -> RoleName {
    RoleName::new(name).unwrap()
}
