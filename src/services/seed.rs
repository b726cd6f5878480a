/*
 * Responsibility
 * - 起動時の初期データ投入 (role 3 種 + 任意の bootstrap admin)
 * - 何度実行しても結果が変わらない (既存行はそのまま)
 */
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::repos::CredentialStore;
use crate::repos::error::RepoError;
use crate::repos::models::NewUser;
use crate::services::auth::{PasswordService, roles};

pub async fn seed(
    store: &dyn CredentialStore,
    passwords: &PasswordService,
    admin: Option<&BootstrapAdmin>,
) -> Result<(), AppError> {
    for name in roles::DEFAULT_ROLES {
        if store.find_role_by_name(name).await?.is_some() {
            continue;
        }
        match store.create_role(name).await {
            Ok(role) => info!(role_id = role.id, role = %role.name, "seeded role"),
            // another instance won the race
            Err(RepoError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let Some(admin) = admin else {
        return Ok(());
    };

    if store.find_user_by_email(&admin.email).await?.is_some() {
        return Ok(());
    }

    let admin_role = store
        .find_role_by_name(roles::ADMIN)
        .await?
        .ok_or(AppError::Internal)?;

    let user = store
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash: passwords.hash(&admin.password)?,
            role_ids: vec![admin_role.id],
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "created bootstrap administrator");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::MemoryStore;
    use crate::repos::store::{RoleStore, UserStore};

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "s3cret!".to_string(),
        }
    }

    #[tokio::test]
    async fn seeds_default_roles_once() {
        let store = MemoryStore::new();
        let passwords = PasswordService::new();

        seed(&store, &passwords, None).await.unwrap();
        seed(&store, &passwords, None).await.unwrap();

        let names: Vec<String> = store
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["Administrador", "Lector", "Usuario"]);
    }

    #[tokio::test]
    async fn bootstrap_admin_gets_admin_role_and_a_usable_password() {
        let store = MemoryStore::new();
        let passwords = PasswordService::new();

        seed(&store, &passwords, Some(&admin())).await.unwrap();
        seed(&store, &passwords, Some(&admin())).await.unwrap();

        assert_eq!(store.list_users().await.unwrap().len(), 1);

        let creds = store
            .find_user_by_email("root@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(creds.user.role_names().any(|r| r == roles::ADMIN));
        assert!(passwords.verify("s3cret!", &creds.password_hash));
    }
}
