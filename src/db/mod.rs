use sqlx::{PgPool, Row};
use tracing::{error, info};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Initialize the database schema from the bundled schema.sql
pub async fn init_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Initializing database schema...");

    // One statement per semicolon; the Postgres prepared-statement
    // protocol takes a single statement at a time.
    for statement in SCHEMA_SQL.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Err(e) = sqlx::query(statement).execute(pool).await {
            error!("Failed to execute schema statement: {}", e);
            return Err(e);
        }
    }

    info!("Database schema initialized successfully");
    Ok(())
}

/// Helpers for tests that run against a real database.
#[cfg(all(test, feature = "db-tests"))]
pub mod testutil {
    use sqlx::{PgPool, Row};
    use uuid::Uuid;

    pub async fn setup(pool: &PgPool) {
        super::init_db(pool).await.unwrap();
    }

    pub async fn create_user(pool: &PgPool, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO social.users (id, username, email, password_hash)
             VALUES ($1, $2, $3, 'not-a-real-hash')",
        )
        .bind(id)
        .bind(username)
        .bind(format!("{}@example.com", username))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    pub async fn create_post(pool: &PgPool, user_id: Uuid, content: &str) -> i64 {
        sqlx::query("INSERT INTO social.posts (content, user_id) VALUES ($1, $2) RETURNING id")
            .bind(content)
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
            .get(0)
    }

    pub async fn count(pool: &PgPool, query: &str, bind: i64) -> i64 {
        sqlx::query(query)
            .bind(bind)
            .fetch_one(pool)
            .await
            .unwrap()
            .get(0)
    }
}

/// Check if the users table exists
pub async fn check_db_initialized(pool: &PgPool) -> bool {
    let result = sqlx::query(
        "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = 'social' AND table_name = 'users')",
    )
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => row.try_get::<bool, _>(0).unwrap_or(false),
        Err(_) => false,
    }
}
