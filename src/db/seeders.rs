//! Database seeders for built-in data
//!
//! Seeds the service catalog and the admin account on startup.

use anyhow::{anyhow, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::ROLE_ADMIN;
use crate::api::auth::hash_password;

/// Seed the built-in service catalog (runs on every startup to add/update entries)
pub async fn seed_services(pool: &SqlitePool) -> Result<()> {
    info!("Seeding service catalog...");

    // Format: (id, name, description, category, price, duration_minutes)
    let services: Vec<(&str, &str, &str, &str, f64, i64)> = vec![
        // ==================== HAIR ====================
        (
            "hair-trim",
            "Hair Trim",
            "Quick trim to tidy ends and keep your current style.",
            "hair",
            250.0,
            30,
        ),
        (
            "haircut-style",
            "Haircut & Style",
            "Consultation, wash, cut and blow-dry styling.",
            "hair",
            450.0,
            60,
        ),
        (
            "hair-color",
            "Hair Color",
            "Full single-process color with gloss finish.",
            "hair",
            1500.0,
            120,
        ),
        (
            "hair-rebond",
            "Hair Rebond",
            "Straightening treatment for smooth, manageable hair.",
            "hair",
            2500.0,
            180,
        ),
        // ==================== NAILS ====================
        (
            "manicure",
            "Manicure",
            "Nail shaping, cuticle care and polish.",
            "nails",
            200.0,
            45,
        ),
        (
            "pedicure",
            "Pedicure",
            "Foot soak, scrub, nail care and polish.",
            "nails",
            250.0,
            60,
        ),
        // ==================== SKIN ====================
        (
            "facial",
            "Classic Facial",
            "Deep cleanse, exfoliation, extraction and mask.",
            "skin",
            800.0,
            60,
        ),
        (
            "eyebrow-threading",
            "Eyebrow Threading",
            "Precise brow shaping using cotton thread.",
            "skin",
            150.0,
            15,
        ),
    ];

    for (id, name, description, category, price, duration) in services {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, description, category, price, duration_minutes)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                price = excluded.price,
                duration_minutes = excluded.duration_minutes
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(price)
        .bind(duration)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Create the admin account if it doesn't exist yet. Skipped when no password is configured.
pub async fn ensure_admin_user(pool: &SqlitePool, email: &str, password: Option<&str>) -> Result<()> {
    let Some(password) = password else {
        warn!("No admin password configured; skipping admin account seeding");
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow!("Failed to hash admin password: {}", e))?;

    sqlx::query("INSERT INTO users (email, password_hash, role, created_at) VALUES (?, ?, ?, ?)")
        .bind(&email)
        .bind(&password_hash)
        .bind(ROLE_ADMIN)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    info!(email = %email, "Created admin account");
    Ok(())
}
