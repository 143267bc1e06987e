use std::time::Duration;

use porteiro_core::entities::UserType;
use porteiro_core::module_id::ModuleId;
use porteiro_core::permission::{Action, Capabilities};

use super::resolver::{resolve, PermissionGrid};
use crate::services::entity_store::EntityStore;

async fn store_with_modules() -> (EntityStore, UserType) {
    let store = EntityStore::in_memory(Duration::from_secs(5), 4);
    store.create_module("Estoque").await.unwrap();
    store.create_module("Vendas").await.unwrap();
    store.create_module("Pedidos").await.unwrap();
    let user_type = store.create_user_type("Estoquista").await.unwrap();
    (store, user_type)
}

#[tokio::test]
async fn test_resolve_produces_one_fail_closed_row_per_module() {
    let (store, _user_type) = store_with_modules().await;
    let modules = store.modules().await.unwrap();

    let rows = resolve(&modules, &[]);
    assert_eq!(rows.len(), modules.len());
    for row in &rows {
        assert_eq!(row.caps, Capabilities::none());
    }
}

#[tokio::test]
async fn test_grid_tracks_dirty_rows_against_the_loaded_snapshot() {
    let (store, user_type) = store_with_modules().await;
    let estoque = ModuleId::Custom("estoque".to_string());

    let mut grid = PermissionGrid::load(&store, &user_type.id).await.unwrap();
    assert_eq!(grid.dirty_rows().count(), 0);

    grid.set(&estoque, Action::Edit, true).unwrap();
    let dirty: Vec<_> = grid.dirty_rows().collect();
    assert_eq!(dirty.len(), 1);
    assert_eq!(dirty[0].module_id, estoque);
    // Granting edit switched access on through the monotonic rule.
    assert!(dirty[0].caps.access && dirty[0].caps.edit);

    let saved = grid.save(&store).await.unwrap();
    assert_eq!(saved, 1);
    assert_eq!(grid.dirty_rows().count(), 0);

    // Saving again writes nothing.
    assert_eq!(grid.save(&store).await.unwrap(), 0);

    let reloaded = PermissionGrid::load(&store, &user_type.id).await.unwrap();
    let row = reloaded
        .rows()
        .iter()
        .find(|r| r.module_id == estoque)
        .unwrap();
    assert!(row.caps.edit && row.caps.access);
    assert!(row.permission_id.is_some());
}

#[tokio::test]
async fn test_revoking_access_clears_the_whole_row_in_one_edit() {
    let (store, user_type) = store_with_modules().await;
    let estoque = ModuleId::Custom("estoque".to_string());
    store
        .upsert_permission(
            &user_type.id,
            &estoque,
            Capabilities {
                access: true,
                edit: true,
                delete: true,
                ..Capabilities::none()
            },
        )
        .await
        .unwrap();

    let mut grid = PermissionGrid::load(&store, &user_type.id).await.unwrap();
    grid.set(&estoque, Action::Access, false).unwrap();

    let row = grid
        .rows()
        .iter()
        .find(|r| r.module_id == estoque)
        .unwrap();
    assert_eq!(row.caps, Capabilities::none());

    grid.save(&store).await.unwrap();
    let stored = store
        .permissions_for_user_type(&user_type.id)
        .await
        .unwrap();
    assert_eq!(stored[0].caps, Capabilities::none());
}

#[tokio::test]
async fn test_unknown_user_type_is_rejected_on_load() {
    let (store, _user_type) = store_with_modules().await;
    assert!(PermissionGrid::load(&store, "missing").await.is_err());
}

#[tokio::test]
async fn test_dirty_only_saves_leave_unrelated_rows_alone() {
    let (store, user_type) = store_with_modules().await;
    let estoque = ModuleId::Custom("estoque".to_string());
    let vendas = ModuleId::Custom("vendas".to_string());

    let mut first = PermissionGrid::load(&store, &user_type.id).await.unwrap();
    let mut second = PermissionGrid::load(&store, &user_type.id).await.unwrap();

    first.set(&estoque, Action::Create, true).unwrap();
    first.save(&store).await.unwrap();

    // The second session edits a different module; its clean estoque row is
    // not written back, so the first session's change survives.
    second.set(&vendas, Action::Access, true).unwrap();
    second.save(&store).await.unwrap();

    let stored = store
        .permissions_for_user_type(&user_type.id)
        .await
        .unwrap();
    let estoque_caps = stored
        .iter()
        .find(|p| p.module_id == estoque)
        .unwrap()
        .caps;
    assert!(estoque_caps.create && estoque_caps.access);
}

#[tokio::test]
async fn test_concurrent_edits_to_one_row_are_last_writer_wins() {
    let (store, user_type) = store_with_modules().await;
    let estoque = ModuleId::Custom("estoque".to_string());

    let mut first = PermissionGrid::load(&store, &user_type.id).await.unwrap();
    let mut second = PermissionGrid::load(&store, &user_type.id).await.unwrap();

    first.set(&estoque, Action::Create, true).unwrap();
    first.save(&store).await.unwrap();

    // The second session edits the same row from its older snapshot. Its
    // save replaces the row wholesale: expected behavior, not a bug.
    second.set(&estoque, Action::Delete, true).unwrap();
    second.save(&store).await.unwrap();

    let stored = store
        .permissions_for_user_type(&user_type.id)
        .await
        .unwrap();
    let caps = stored
        .iter()
        .find(|p| p.module_id == estoque)
        .unwrap()
        .caps;
    assert!(caps.access && caps.delete);
    assert!(!caps.create, "earlier writer's change is silently lost");

    // Still a single row for the pair.
    assert_eq!(
        stored.iter().filter(|p| p.module_id == estoque).count(),
        1
    );
}
