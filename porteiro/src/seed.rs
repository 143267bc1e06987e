use secrecy::SecretString;
use tracing::info;

use porteiro_core::error::Result;
use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::Capabilities;

use crate::services::entity_store::{EntityStore, NewUser};

const DEMO_PASSWORD: &str = "password";

fn read_only() -> Capabilities {
    Capabilities {
        access: true,
        ..Capabilities::none()
    }
}

fn full_but_delete() -> Capabilities {
    Capabilities {
        delete: false,
        ..Capabilities::full()
    }
}

/// Install the demo dataset: the builtin administration modules plus the
/// sales-side modules, three roles with their grant grids, and one demo
/// account per role (credential: "password").
pub async fn seed_demo_data(store: &EntityStore) -> Result<()> {
    // Builtin administration modules carry localized display names.
    store.register_module(ModuleId::Users, "Usuários").await?;
    store
        .register_module(ModuleId::UserTypes, "Tipos de Usuário")
        .await?;
    store.register_module(ModuleId::Modules, "Módulos").await?;
    store
        .register_module(ModuleId::Permissions, "Permissões")
        .await?;

    let vendas = store.create_module("Vendas").await?.id;
    let pedidos = store.create_module("Pedidos").await?.id;
    let produtos = store.create_module("Produtos").await?.id;
    let clientes = store.create_module("Clientes").await?.id;

    let admin = store.create_user_type("Administrador").await?;
    let seller = store.create_user_type("Vendedor").await?;
    let customer = store.create_user_type("Cliente").await?;

    for module in store.modules().await? {
        store
            .upsert_permission(&admin.id, &module.id, Capabilities::full())
            .await?;
    }

    for (module, caps) in [
        (&ModuleId::Users, read_only()),
        (&vendas, full_but_delete()),
        (&pedidos, full_but_delete()),
        (&produtos, read_only()),
        (&clientes, full_but_delete()),
    ] {
        store.upsert_permission(&seller.id, module, caps).await?;
    }

    for (module, caps) in [
        (
            &pedidos,
            Capabilities {
                access: true,
                create: true,
                ..Capabilities::none()
            },
        ),
        (&produtos, read_only()),
    ] {
        store.upsert_permission(&customer.id, module, caps).await?;
    }

    for (full_name, username, email, user_type_id) in [
        ("Admin User", "admin", "admin@example.com", &admin.id),
        ("Vendedor", "vendedor", "vendedor@example.com", &seller.id),
        ("Cliente", "cliente", "cliente@example.com", &customer.id),
    ] {
        store
            .create_user(NewUser {
                full_name: full_name.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                user_type_id: user_type_id.clone(),
                password: SecretString::from(DEMO_PASSWORD.to_string()),
            })
            .await?;
    }

    info!("Demo dataset installed");
    Ok(())
}
