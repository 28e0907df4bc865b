use crate::domain::identity::errors::IdentityError;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::RoleName;
use crate::domain::identity::models::SignupCommand;
use crate::domain::identity::ports::IdentityServicePort;
use crate::domain::identity::ports::RoleRepository;

/// What must exist before the service accepts traffic.
#[derive(Debug)]
pub struct ProvisioningPlan {
    /// Roles created when absent
    pub seed: Vec<Role>,
    /// Roles that must exist once seeding is done
    pub required: Vec<RoleName>,
    /// Administrator created when its handle is not registered yet
    pub administrator: Option<SignupCommand>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisioningReport {
    pub roles_created: usize,
    pub administrator_created: bool,
}

/// Bring the role store and the bootstrap administrator up to `plan`.
///
/// Safe to run on every start: existing roles and identities are left as
/// they are.
///
/// # Errors
/// * `RoleNotConfigured` - A required role is still missing after seeding
/// * `DatabaseError` - Store operation failed
pub async fn provision<RR>(
    roles: &RR,
    service: &dyn IdentityServicePort,
    plan: ProvisioningPlan,
) -> Result<ProvisioningReport, IdentityError>
where
    RR: RoleRepository + ?Sized,
{
    let mut report = ProvisioningReport::default();

    for role in plan.seed {
        if roles.find_by_name(&role.name).await?.is_some() {
            continue;
        }
        let created = roles.create(role).await?;
        tracing::info!(role = %created.name, "Role created");
        report.roles_created += 1;
    }

    for name in &plan.required {
        if roles.find_by_name(name).await?.is_none() {
            return Err(IdentityError::RoleNotConfigured(name.to_string()));
        }
    }

    if let Some(command) = plan.administrator {
        if service.find_by_handle(&command.handle).await?.is_none() {
            match service.create_administrator(command).await {
                Ok(identity) => {
                    tracing::info!(
                        identity_id = %identity.id,
                        handle = %identity.handle,
                        "Bootstrap administrator created"
                    );
                    report.administrator_created = true;
                }
                // Another instance won the race
                Err(IdentityError::DuplicateIdentity(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::domain::identity::models::LoginHandle;
    use crate::domain::identity::models::Password;
    use crate::domain::identity::models::RoleModel;
    use crate::domain::identity::ports::IdentityRepository;
    use crate::domain::identity::service::IdentityService;
    use crate::domain::identity::service::RolePolicy;
    use crate::outbound::repositories::InMemoryIdentityRepository;
    use crate::outbound::repositories::InMemoryRoleRepository;

    type Service = IdentityService<InMemoryIdentityRepository, InMemoryRoleRepository>;

    fn setup() -> (
        Arc<InMemoryIdentityRepository>,
        Arc<InMemoryRoleRepository>,
        Service,
    ) {
        let identities = Arc::new(InMemoryIdentityRepository::new());
        let roles = Arc::new(InMemoryRoleRepository::new());
        let authenticator = Arc::new(
            auth::Authenticator::with_hasher(
                "provisioning-test-secret",
                Duration::hours(1),
                auth::PasswordHasher::bcrypt(4),
            )
            .unwrap(),
        );
        let service = IdentityService::new(
            Arc::clone(&identities),
            Arc::clone(&roles),
            authenticator,
            RolePolicy {
                model: RoleModel::Single,
                default_role: RoleName::new("SPECTATOR").unwrap(),
                admin_role: RoleName::new("ADMIN").unwrap(),
            },
        );
        (identities, roles, service)
    }

    fn plan(administrator: bool) -> ProvisioningPlan {
        let seed = ["SPECTATOR", "VOLUNTEER", "COMMISSIONER", "ADMIN"]
            .into_iter()
            .map(|name| Role::new(RoleName::new(name).unwrap(), None))
            .collect();
        ProvisioningPlan {
            seed,
            required: vec![
                RoleName::new("SPECTATOR").unwrap(),
                RoleName::new("ADMIN").unwrap(),
            ],
            administrator: administrator.then(|| {
                SignupCommand::new(
                    LoginHandle::new("root@example.com".to_string()).unwrap(),
                    Password::new("bootstrap-pass".to_string()).unwrap(),
                    None,
                )
            }),
        }
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let (identities, roles, service) = setup();

        let first = provision(roles.as_ref(), &service, plan(true)).await.unwrap();
        assert_eq!(
            first,
            ProvisioningReport {
                roles_created: 4,
                administrator_created: true,
            }
        );

        let second = provision(roles.as_ref(), &service, plan(true)).await.unwrap();
        assert_eq!(second, ProvisioningReport::default());

        assert_eq!(roles.list_all().await.unwrap().len(), 4);
        let administrators = identities.list_all().await.unwrap();
        assert_eq!(administrators.len(), 1);
        assert!(administrators[0]
            .roles
            .contains(&RoleName::new("ADMIN").unwrap()));
    }

    #[tokio::test]
    async fn test_provision_without_administrator() {
        let (identities, roles, service) = setup();

        let report = provision(roles.as_ref(), &service, plan(false)).await.unwrap();

        assert!(!report.administrator_created);
        assert!(identities.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_role_fails() {
        let (_, roles, service) = setup();
        let mut plan = plan(true);
        plan.seed.retain(|role| role.name.as_str() != "ADMIN");

        let result = provision(roles.as_ref(), &service, plan).await;
        assert!(matches!(result, Err(IdentityError::RoleNotConfigured(ref r)) if r == "ADMIN"));
    }
}
