//! Development seed data: a handful of influencers and one campaign.

use sqlx::PgPool;

use crate::DbError;

struct SeedInfluencer {
    name: &'static str,
    email: &'static str,
    instagram_handle: &'static str,
    followers_count: i64,
}

const SEED_INFLUENCERS: &[SeedInfluencer] = &[
    SeedInfluencer {
        name: "Maya Ortiz",
        email: "maya@orbitcreative.test",
        instagram_handle: "maya.makes",
        followers_count: 48_200,
    },
    SeedInfluencer {
        name: "Jonas Leclerc",
        email: "jonas@leclerc.test",
        instagram_handle: "jonas_runs_far",
        followers_count: 112_000,
    },
    SeedInfluencer {
        name: "Priya Nair",
        email: "priya@nairstudio.test",
        instagram_handle: "priyacooks",
        followers_count: 9_450,
    },
];

/// Upsert the seed influencers and one draft campaign with all of them
/// invited. Idempotent: rerunning updates rather than duplicates.
///
/// Returns the number of influencers processed. All writes run inside a
/// single transaction; if any operation fails the batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo_data(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    let mut influencer_ids = Vec::with_capacity(SEED_INFLUENCERS.len());
    for seed in SEED_INFLUENCERS {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO influencers (name, email, instagram_handle, instagram_url, followers_count) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (email) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 instagram_handle = EXCLUDED.instagram_handle, \
                 instagram_url = EXCLUDED.instagram_url, \
                 followers_count = EXCLUDED.followers_count, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(seed.name)
        .bind(seed.email)
        .bind(seed.instagram_handle)
        .bind(format!(
            "https://www.instagram.com/{}/",
            seed.instagram_handle
        ))
        .bind(seed.followers_count)
        .fetch_one(&mut *tx)
        .await?;
        influencer_ids.push(id);
    }

    // No unique key on campaign names; look up before inserting so reruns
    // reuse the existing seed campaign.
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM campaigns WHERE name = 'Spring Launch' AND deleted_at IS NULL",
    )
    .fetch_optional(&mut *tx)
    .await?;

    let campaign_id = match existing {
        Some(id) => id,
        None => {
            sqlx::query_scalar(
                "INSERT INTO campaigns (name, brief, status, budget) \
                 VALUES ('Spring Launch', 'Seed campaign for local development', 'draft', 2500.00) \
                 RETURNING id",
            )
            .fetch_one(&mut *tx)
            .await?
        }
    };

    for influencer_id in &influencer_ids {
        sqlx::query(
            "INSERT INTO campaign_influencers (campaign_id, influencer_id, status) \
             VALUES ($1, $2, 'invited') \
             ON CONFLICT (campaign_id, influencer_id) DO NOTHING",
        )
        .bind(campaign_id)
        .bind(influencer_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(influencer_ids.len())
}
