//! Actor seeding.
//!
//! Generates fake accounts, inserts them in batches and provisions their role
//! profiles through [`ProfileService`], so seeded extensions get business ids
//! from the same sequence as real ones.

use std::time::Instant;

use edumanage::ProfileService;
use edumanage_models::{ActorId, ExtensionId, ProfileRole};
use fake::Fake;
use fake::faker::name::en::*;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::ActorSeed;

/// 2 params per actor.
const BATCH_SIZE: usize = 1000;

pub fn generate_actors(role: ProfileRole, count: usize) -> Vec<ActorSeed> {
    (0..count)
        .into_par_iter()
        .map(|_| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let id = ActorId::new();
            let email = format!(
                "{}.{}+{}-{}@example.com",
                first_name.to_lowercase().replace(' ', ""),
                last_name.to_lowercase().replace(' ', ""),
                role.as_str(),
                id.into_inner().simple()
            );
            ActorSeed { id, email, role }
        })
        .collect()
}

pub async fn insert_actors(db: &PgPool, actors: &[ActorSeed]) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    for chunk in actors.chunks(BATCH_SIZE) {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO actors (id, email) ");
        query.push_values(chunk, |mut row, actor| {
            row.push_bind(actor.id).push_bind(&actor.email);
        });
        query.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Inserts and provisions `count` actors of `role`, returning their
/// extension ids.
pub async fn seed_role(
    db: &PgPool,
    profiles: &ProfileService,
    role: ProfileRole,
    count: usize,
) -> anyhow::Result<Vec<ExtensionId>> {
    let start_time = Instant::now();
    println!("👥 Seeding {} {} accounts...", count, role);

    let actors = generate_actors(role, count);
    insert_actors(db, &actors).await?;

    let mut extensions = Vec::with_capacity(actors.len());
    for actor in &actors {
        let provisioned = profiles.ensure_profile(actor.id, actor.role).await?;
        if let Some(extension) = provisioned.extension {
            extensions.push(extension.id);
        }
    }

    println!(
        "   ✓ Provisioned {} {} profiles in {:?}",
        extensions.len(),
        role,
        start_time.elapsed()
    );
    Ok(extensions)
}
