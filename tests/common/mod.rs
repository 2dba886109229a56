use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use playportal::config::{Config, DbPool};
use playportal::services::email::{EmailSender, MemoryMailer};

pub const TEST_OTP_CODE: &str = "246810";
pub const ALLOWLISTED_EMAIL: &str = "reviewer@example.com";

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: DbPool,
    pub mailbox: Arc<MemoryMailer>,
}

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        otp_expiry_minutes: 10,
        invitation_expiry_days: 7,
        inactivity_threshold_days: 90,
        signup_cache_ttl_secs: 300,
        rate_limit_burst: 10_000,
        test_identifiers: vec![ALLOWLISTED_EMAIL.to_string()],
        test_otp_code: TEST_OTP_CODE.to_string(),
        twilio: None,
    }
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        // One pooled connection keeps the in-memory database alive and
        // private to this context.
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory SQLite");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let mailbox = Arc::new(MemoryMailer::new());
        let mailer: Arc<dyn EmailSender> = mailbox.clone();

        let app = playportal::create_app(db.clone(), Arc::new(test_config()), mailer).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            db,
            mailbox,
        }
    }

    /// Registers a player through the API.
    pub async fn register_player(&self, email: &str, phone: Option<&str>) {
        let response = self
            .server
            .post("/auth/register")
            .json(&json!({
                "name": "Test Player",
                "email": email,
                "phone_number": phone,
                "password": test_password(),
                "password_confirm": test_password()
            }))
            .await;
        assert_eq!(response.status_code(), 201, "register failed: {}", response.text());
    }

    /// Full login + OTP dance; returns (user_id, access_token).
    pub async fn login_token(&self, identifier: &str, password: &str) -> (String, String) {
        let login = self
            .server
            .post("/auth/login")
            .json(&json!({ "identifier": identifier, "password": password }))
            .await;
        assert_eq!(login.status_code(), 200, "login failed: {}", login.text());

        let body: serde_json::Value = login.json();
        let user_id = body["user_id"].as_str().unwrap().to_string();

        let code = self.latest_otp_secret(&user_id).await;
        let verify = self
            .server
            .post("/auth/verify-otp")
            .json(&json!({ "user_id": &user_id, "otp": code }))
            .await;
        assert_eq!(verify.status_code(), 200, "verify-otp failed: {}", verify.text());

        let tokens: serde_json::Value = verify.json();
        (user_id, tokens["access_token"].as_str().unwrap().to_string())
    }

    /// Inserts a user straight into the database (cheap bcrypt cost, test
    /// only) and returns its id.
    pub async fn insert_user(&self, email: &str, phone: Option<&str>, role: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let hash = bcrypt::hash(test_password(), 4).unwrap();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone_number, password_hash, role_id,
                               is_active, is_verified, is_adult, is_deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, (SELECT id FROM roles WHERE name = ?), 1, 1, 1, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(format!("User {}", &id[..8]))
        .bind(email)
        .bind(phone)
        .bind(&hash)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .expect("insert_user failed");

        id
    }

    /// Admin account plus a logged-in access token.
    pub async fn admin_token(&self) -> (String, String) {
        let email = test_email();
        self.insert_user(&email, None, "admin").await;
        self.login_token(&email, test_password()).await
    }

    pub async fn superadmin_token(&self) -> (String, String) {
        let email = test_email();
        self.insert_user(&email, None, "superadmin").await;
        self.login_token(&email, test_password()).await
    }

    pub async fn insert_game(&self, title: &str, genre: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO games (id, title, slug, genre, description, is_active, created_at) VALUES (?, ?, ?, ?, '', 1, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(title.to_lowercase().replace(' ', "-"))
        .bind(genre)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .expect("insert_game failed");

        id
    }

    pub async fn insert_session(
        &self,
        user_id: &str,
        game_id: &str,
        started_at: DateTime<Utc>,
        duration_seconds: Option<i64>,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let ended_at = duration_seconds.map(|d| started_at + chrono::Duration::seconds(d));

        sqlx::query(
            r#"
            INSERT INTO game_sessions (id, user_id, game_id, activity_type, started_at, ended_at, duration_seconds)
            VALUES (?, ?, ?, 'gameplay', ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(game_id)
        .bind(started_at)
        .bind(ended_at)
        .bind(duration_seconds)
        .execute(&self.db)
        .await
        .expect("insert_session failed");

        id
    }

    pub async fn latest_otp_secret(&self, user_id: &str) -> String {
        let (secret,): (String,) = sqlx::query_as(
            "SELECT secret FROM otps WHERE user_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .expect("no OTP row for user");

        secret
    }

    pub async fn soft_delete_user(&self, id: &str) {
        sqlx::query(
            "UPDATE users SET is_deleted = 1, deleted_at = ?, is_active = 0 WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await
        .unwrap();
    }

    /// Polls until the closure over a scalar query returns true.
    pub async fn wait_for_count(&self, sql: &str, bind: &str, expected: i64) {
        for _ in 0..100 {
            let (count,): (i64,) = sqlx::query_as(sql)
                .bind(bind)
                .fetch_one(&self.db)
                .await
                .unwrap();
            if count == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected count {} not reached for: {}", expected, sql);
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

// Helper to generate test password
#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}

/// Pulls a `token=<hex>` query parameter out of an email body.
#[allow(dead_code)]
pub fn extract_token(body: &str) -> String {
    let start = body.find("token=").expect("no token in email body") + "token=".len();
    body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}
