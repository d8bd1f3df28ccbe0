//! Seed data shared by service, HTTP and storage tests.

use asset_lending_core::error::Result;
use asset_lending_core::lifecycle::RequestInput;
use asset_lending_core::store::LendingStore;
use asset_lending_core::types::{Actor, Asset, Category, NewAsset, NewUser, Role, User};

/// One user per role, a category and a two-unit asset.
#[derive(Clone, Debug)]
pub struct Seed {
    /// Admin caller
    pub admin: Actor,
    /// Employee caller
    pub employee: Actor,
    /// Manager caller
    pub manager: Actor,
    /// "Electronics"
    pub category: Category,
    /// "Projector", initial and available quantity 2
    pub asset: Asset,
}

impl Seed {
    /// Request body for the seeded asset.
    #[must_use]
    pub fn request_for_asset(&self) -> RequestInput {
        RequestInput {
            user_id: Some(self.employee.user_id),
            asset_id: self.asset.id,
            return_date: Some("2025-02-01".to_string()),
            description: "client demo".to_string(),
        }
    }
}

/// Caller identity for a directory entry.
#[must_use]
pub fn actor(user: &User) -> Actor {
    Actor {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

/// Insert a user with the given role.
///
/// # Errors
///
/// Propagates store failures.
pub async fn user(store: &dyn LendingStore, name: &str, role: Role) -> Result<User> {
    store
        .create_user(NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            divisi: "Operations".to_string(),
            role,
        })
        .await
}

/// Insert an asset in `category` with `initial` units.
///
/// # Errors
///
/// Propagates store failures.
pub async fn asset(
    store: &dyn LendingStore,
    category: &Category,
    name: &str,
    initial: i32,
) -> Result<Asset> {
    store
        .create_asset(NewAsset {
            category_id: category.id,
            is_maintenance: false,
            name: name.to_string(),
            description: format!("{name} for loan"),
            initial_quantity: initial,
            photo: String::new(),
        })
        .await
}

/// Seed the standard data set.
///
/// # Errors
///
/// Propagates store failures.
pub async fn seed(store: &dyn LendingStore) -> Result<Seed> {
    let admin = user(store, "Admin", Role::Admin).await?;
    let employee = user(store, "Budi", Role::Employee).await?;
    let manager = user(store, "Sari", Role::Manager).await?;
    let category = store.create_category("Electronics").await?;
    let asset = asset(store, &category, "Projector", 2).await?;

    Ok(Seed {
        admin: actor(&admin),
        employee: actor(&employee),
        manager: actor(&manager),
        category,
        asset,
    })
}
