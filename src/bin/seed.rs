use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::{PgPool, postgres::PgPoolOptions};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::auth::Claims,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Schema comes from the sea-orm migrator; rows are plain SQL upserts.
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    println!("Admin token: {}", dev_token(&config.jwt_secret, admin_id, "admin")?);
    println!("User token:  {}", dev_token(&config.jwt_secret, user_id, "user")?);
    Ok(())
}

async fn ensure_user(pool: &PgPool, email: &str, role: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, role, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_catalog(pool: &PgPool) -> anyhow::Result<()> {
    let mut color_ids = Vec::new();
    for (name, hex) in [("Black", "#000000"), ("White", "#FFFFFF"), ("Navy", "#1F2A44")] {
        color_ids.push(ensure_named(pool, "colors", name, Some(hex)).await?);
    }
    let mut size_ids = Vec::new();
    for name in ["S", "M", "L", "XL"] {
        size_ids.push(ensure_named(pool, "sizes", name, None).await?);
    }

    // (name, description, price, discount, stock)
    let products: [(&str, &str, i64, Option<i64>, i32); 4] = [
        ("Linen Shirt", "Breathable summer shirt", 35000, None, 50),
        ("Chino Pants", "Everyday cotton chinos", 30000, Some(5000), 40),
        ("Wool Cardigan", "Midweight knit cardigan", 59000, Some(9000), 20),
        ("Canvas Tote", "Heavy canvas shopping bag", 12000, None, 200),
    ];

    for (name, desc, price, sale_price, stock) in products {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description, price, sale_price, stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO UPDATE
                SET price = EXCLUDED.price, sale_price = EXCLUDED.sale_price
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(sale_price)
        .bind(stock)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        for color_id in &color_ids {
            sqlx::query(
                "INSERT INTO product_colors (product_id, color_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(product_id)
            .bind(color_id)
            .execute(pool)
            .await?;
        }
        for size_id in &size_ids {
            sqlx::query(
                "INSERT INTO product_sizes (product_id, size_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(product_id)
            .bind(size_id)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}

/// Colors and sizes have no unique constraint, so look up by name first.
async fn ensure_named(
    pool: &PgPool,
    table: &str,
    name: &str,
    hex_code: Option<&str>,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE name = $1"))
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    match hex_code {
        Some(hex) => {
            sqlx::query(&format!("INSERT INTO {table} (id, name, hex_code) VALUES ($1, $2, $3)"))
                .bind(id)
                .bind(name)
                .bind(hex)
                .execute(pool)
                .await?;
        }
        None => {
            sqlx::query(&format!("INSERT INTO {table} (id, name) VALUES ($1, $2)"))
                .bind(id)
                .bind(name)
                .execute(pool)
                .await?;
        }
    }
    Ok(id)
}

fn dev_token(secret: &str, user_id: Uuid, role: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::days(30)).timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}
