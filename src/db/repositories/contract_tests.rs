//! Shared behaviour tests for the list queries
//!
//! Every check runs against SQLite, and against Postgres when run with
//! `--ignored` and `POSTGRES_TEST_URL` pointing at a scratch database. Both
//! backends must return the same rows in the same order for the same plan.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{
    ContactRepository, ModelRepository, SqlxContactRepository, SqlxModelRepository,
};
use crate::config::{DatabaseConfig, DatabaseDriver};
use crate::db::query::ListPlan;
use crate::db::{create_pool, create_test_pool, migrations, DynDatabasePool};
use crate::models::{
    ContactListQuery, ContactSource, CreateContactInput, ModelInput, ModelListQuery,
};

struct Repos {
    pool: DynDatabasePool,
    models: Arc<dyn ModelRepository>,
    contacts: Arc<dyn ContactRepository>,
}

impl Repos {
    fn new(pool: DynDatabasePool) -> Self {
        Self {
            models: SqlxModelRepository::boxed(pool.clone()),
            contacts: SqlxContactRepository::boxed(pool.clone()),
            pool,
        }
    }

    async fn reset(&self) {
        for table in ["model_photos", "models", "contacts"] {
            self.pool
                .execute(&format!("DELETE FROM {}", table))
                .await
                .expect("Failed to reset table");
        }
    }

    async fn model(&self, name: &str, city: Option<&str>, age: Option<i32>) -> i64 {
        self.models
            .create(&ModelInput {
                name: name.to_string(),
                city: city.map(str::to_string),
                age,
                ..Default::default()
            })
            .await
            .expect("Failed to create model")
            .id
    }

    async fn contact(&self, name: &str, company: Option<&str>, source: ContactSource) -> i64 {
        self.contacts
            .create(&CreateContactInput {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: None,
                company: company.map(str::to_string),
                message: None,
                source,
            })
            .await
            .expect("Failed to create contact")
            .id
    }

    async fn backdate_contact(&self, id: i64, at: DateTime<Utc>) {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("UPDATE contacts SET created_at = ? WHERE id = ?")
                .bind(at)
                .bind(id)
                .execute(self.pool.sqlite().unwrap())
                .await
                .map(|_| ()),
            DatabaseDriver::Postgres => {
                sqlx::query("UPDATE contacts SET created_at = $1 WHERE id = $2")
                    .bind(at)
                    .bind(id)
                    .execute(self.pool.postgres().unwrap())
                    .await
                    .map(|_| ())
            }
        }
        .expect("Failed to backdate contact");
    }

    async fn model_names(&self, query: ModelListQuery) -> Vec<String> {
        self.models
            .list(&ListPlan::for_models(&query))
            .await
            .expect("Failed to list models")
            .rows
            .into_iter()
            .map(|m| m.name)
            .collect()
    }
}

async fn sqlite_repos() -> Repos {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Repos::new(pool)
}

static POSTGRES_LOCK: Mutex<()> = Mutex::new(());

async fn postgres_repos() -> Repos {
    let url = std::env::var("POSTGRES_TEST_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/vitrina_test".to_string());
    let pool = create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Postgres,
        url,
    })
    .await
    .expect("Failed to connect to Postgres");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Repos::new(pool)
}

fn query(f: impl FnOnce(&mut ModelListQuery)) -> ModelListQuery {
    let mut q = ModelListQuery::default();
    f(&mut q);
    q
}

macro_rules! contract_test {
    ($name:ident) => {
        mod $name {
            #[tokio::test]
            async fn sqlite() {
                let repos = super::sqlite_repos().await;
                repos.reset().await;
                super::$name(&repos).await;
            }

            #[tokio::test]
            #[ignore = "Requires PostgreSQL server"]
            async fn postgres() {
                let _guard = super::POSTGRES_LOCK
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let repos = super::postgres_repos().await;
                repos.reset().await;
                super::$name(&repos).await;
            }
        }
    };
}

async fn pagination_is_bounded(repos: &Repos) {
    for i in 0..7 {
        repos.model(&format!("Model {}", i), None, None).await;
    }

    for size in ["1", "3", "7", "50"] {
        let page = repos
            .models
            .list(&ListPlan::for_models(&query(|q| q.page_size = Some(size.to_string()))))
            .await
            .unwrap();
        let pagination = page.pagination();
        assert_eq!(page.total, 7);
        assert!(page.rows.len() as u32 <= pagination.page_size);
        assert_eq!(
            pagination.total_pages,
            std::cmp::max(1, (7 + pagination.page_size as i64 - 1) / pagination.page_size as i64)
        );
    }

    let beyond = repos
        .models
        .list(&ListPlan::for_models(&query(|q| {
            q.page = Some("9".to_string());
            q.page_size = Some("5".to_string());
        })))
        .await
        .unwrap();
    assert!(beyond.rows.is_empty());
    assert_eq!(beyond.total, 7);
}
contract_test!(pagination_is_bounded);

async fn pages_never_overlap(repos: &Repos) {
    // Equal cities force the id tie-breaker to decide the order
    for i in 0..5 {
        repos.model(&format!("M{}", i), Some("Lima"), None).await;
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let rows = repos
            .models
            .list(&ListPlan::for_models(&query(|q| {
                q.sort_by = Some("ciudad".to_string());
                q.page = Some(page.to_string());
                q.page_size = Some("2".to_string());
            })))
            .await
            .unwrap()
            .rows;
        seen.extend(rows.into_iter().map(|m| m.id));
    }
    let mut unique = seen.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(seen.len(), 5);
    assert_eq!(unique.len(), 5);
}
contract_test!(pages_never_overlap);

async fn unknown_sort_matches_created_at(repos: &Repos) {
    repos.model("Bea", None, Some(30)).await;
    repos.model("Ana", None, Some(20)).await;
    repos.model("Cia", None, Some(25)).await;

    let fallback = repos
        .model_names(query(|q| q.sort_by = Some("password_hash".to_string())))
        .await;
    let created = repos
        .model_names(query(|q| q.sort_by = Some("created_at".to_string())))
        .await;
    assert_eq!(fallback, created);
    assert_eq!(fallback, vec!["Cia", "Ana", "Bea"]);
}
contract_test!(unknown_sort_matches_created_at);

async fn text_sort_ignores_case(repos: &Repos) {
    repos.model("beta", None, None).await;
    repos.model("Alpha", None, None).await;
    repos.model("gamma", None, None).await;

    let names = repos
        .model_names(query(|q| {
            q.sort_by = Some("nombre".to_string());
            q.sort_dir = Some("asc".to_string());
        }))
        .await;
    assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
}
contract_test!(text_sort_ignores_case);

async fn nulls_sort_last_both_ways(repos: &Repos) {
    repos.model("NoAge", None, None).await;
    repos.model("Young", None, Some(18)).await;
    repos.model("Older", None, Some(40)).await;

    let asc = repos
        .model_names(query(|q| {
            q.sort_by = Some("edad".to_string());
            q.sort_dir = Some("asc".to_string());
        }))
        .await;
    assert_eq!(asc, vec!["Young", "Older", "NoAge"]);

    let desc = repos
        .model_names(query(|q| {
            q.sort_by = Some("edad".to_string());
            q.sort_dir = Some("desc".to_string());
        }))
        .await;
    assert_eq!(desc, vec!["Older", "Young", "NoAge"]);
}
contract_test!(nulls_sort_last_both_ways);

async fn search_is_case_insensitive_and_literal(repos: &Repos) {
    repos.model("Ana", Some("Lima"), None).await;
    repos.model("100% Real", None, None).await;
    repos.model("snake_case", Some("Cusco"), None).await;

    let mut hits = repos.model_names(query(|q| q.q = Some("ANA".to_string()))).await;
    hits.sort();
    assert_eq!(hits, vec!["Ana"]);

    let hits = repos.model_names(query(|q| q.q = Some("%".to_string()))).await;
    assert_eq!(hits, vec!["100% Real"]);

    let hits = repos.model_names(query(|q| q.q = Some("_".to_string()))).await;
    assert_eq!(hits, vec!["snake_case"]);

    // Search spans other columns too
    let hits = repos.model_names(query(|q| q.q = Some("cusc".to_string()))).await;
    assert_eq!(hits, vec!["snake_case"]);
}
contract_test!(search_is_case_insensitive_and_literal);

async fn city_and_active_filters(repos: &Repos) {
    let ana = repos.model("Ana", Some("Lima"), None).await;
    repos.model("Bea", Some("lima"), None).await;
    repos.model("Cia", Some("Limassol"), None).await;
    repos.models.set_active(ana, false).await.unwrap();

    let mut lima = repos.model_names(query(|q| q.ciudad = Some("LIMA".to_string()))).await;
    lima.sort();
    assert_eq!(lima, vec!["Ana", "Bea"]);

    let active_lima = repos
        .model_names(query(|q| {
            q.ciudad = Some("lima".to_string());
            q.activa = Some("true".to_string());
        }))
        .await;
    assert_eq!(active_lima, vec!["Bea"]);

    let inactive = repos.model_names(query(|q| q.activa = Some("0".to_string()))).await;
    assert_eq!(inactive, vec!["Ana"]);

    let everything = repos.model_names(query(|q| q.activa = Some("all".to_string()))).await;
    assert_eq!(everything.len(), 3);
}
contract_test!(city_and_active_filters);

async fn photos_come_back_ordered(repos: &Repos) {
    let model = repos
        .models
        .create(&ModelInput {
            name: "Ana".to_string(),
            photos: Some(vec!["url1".to_string(), " ".to_string(), "url2".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();

    let fetched = repos.models.get_by_id(model.id).await.unwrap().unwrap();
    let photos: Vec<(String, i32)> = fetched
        .photos
        .into_iter()
        .map(|p| (p.url, p.sort_order))
        .collect();
    assert_eq!(
        photos,
        vec![("url1".to_string(), 0), ("url2".to_string(), 1)]
    );
}
contract_test!(photos_come_back_ordered);

async fn contact_search_and_sort(repos: &Repos) {
    repos.contact("Eva", Some("zeta corp"), ContactSource::Contact).await;
    repos.contact("Leo", None, ContactSource::Raffle).await;
    repos.contact("Ian", Some("Acme"), ContactSource::Contact).await;

    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&ContactListQuery {
            sort_by: Some("empresa".to_string()),
            sort_dir: Some("asc".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    let names: Vec<&str> = page.rows.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Ian", "Eva", "Leo"]);

    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&ContactListQuery {
            q: Some("ACME".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].name, "Ian");
}
contract_test!(contact_search_and_sort);

async fn contact_date_range_is_inclusive(repos: &Repos) {
    repos.contact("Eva", None, ContactSource::Contact).await;

    let today = Utc::now().date_naive();
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let range = |from: chrono::NaiveDate, to: chrono::NaiveDate| ContactListQuery {
        from: Some(from.format("%Y-%m-%d").to_string()),
        to: Some(to.format("%Y-%m-%d").to_string()),
        ..Default::default()
    };

    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&range(today, today)))
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&range(yesterday, yesterday)))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}
contract_test!(contact_date_range_is_inclusive);

async fn contact_date_range_ends_at_midnight(repos: &Repos) {
    let at = |d: u32, h: u32, m: u32, s: u32| {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, s).single().unwrap()
    };
    let first = repos.contact("First", None, ContactSource::Contact).await;
    let last = repos.contact("Last", None, ContactSource::Contact).await;
    let next = repos.contact("Next", None, ContactSource::Contact).await;
    repos.backdate_contact(first, at(10, 0, 0, 0)).await;
    repos.backdate_contact(last, at(12, 23, 59, 59)).await;
    repos.backdate_contact(next, at(13, 0, 0, 0)).await;

    let query = ContactListQuery {
        from: Some("2024-03-10".to_string()),
        to: Some("2024-03-12".to_string()),
        sort_by: Some("name".to_string()),
        sort_dir: Some("asc".to_string()),
        ..Default::default()
    };
    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&query))
        .await
        .unwrap();
    let names: Vec<&str> = page.rows.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Last"]);

    let query = ContactListQuery {
        from: Some("2024-03-13".to_string()),
        to: Some("2024-03-13".to_string()),
        ..Default::default()
    };
    let page = repos
        .contacts
        .list(&ListPlan::for_contacts(&query))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].name, "Next");
}
contract_test!(contact_date_range_ends_at_midnight);
