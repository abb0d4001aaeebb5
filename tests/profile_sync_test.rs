// ==========================================
// Customer profile sync tests
// ==========================================
// The profile table is rebuilt wholesale from the policy store; these
// tests cover the aggregates and the AI tag carry-over.
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use sigorta_crm::logging;
use sigorta_crm::repository::{CustomerProfileRepository, CustomerProfileRepositoryImpl};

fn insert_policy_row(
    conn: &rusqlite::Connection,
    account_code: &str,
    national_id: &str,
    name: &str,
    gross: Option<f64>,
    net: Option<f64>,
    product: Option<&str>,
    plate: Option<&str>,
    start_date: Option<&str>,
) {
    conn.execute(
        "INSERT INTO policy_record
             (account_code, national_id, customer_name, gross_premium, net_premium,
              product_name, plate_no, start_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'), datetime('now'))",
        rusqlite::params![account_code, national_id, name, gross, net, product, plate, start_date],
    )
    .unwrap();
}

#[tokio::test]
async fn test_rebuild_aggregates_per_account() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        insert_policy_row(
            &conn, "ACC-1", "12345678901", "AYŞE GÜL",
            Some(1_000.0), Some(900.0), Some("KASKO"), Some("34 ABC 123"), Some("2023-03-20"),
        );
        insert_policy_row(
            &conn, "ACC-1", "12345678901", "AYŞE GÜL",
            Some(500.0), None, Some("TRAFİK"), Some("34 ABC 123"), Some("2024-03-20"),
        );
        insert_policy_row(
            &conn, "ACC-2", "98765432109", "MEHMET KAYA",
            Some(2_500.0), Some(2_300.0), Some("DASK"), None, Some("2023-07-01"),
        );
    }

    let repo = CustomerProfileRepositoryImpl::new(&db_path).unwrap();
    let count = repo.rebuild_profiles().await.unwrap();
    assert_eq!(count, 2);

    let profile = repo
        .get_profile("ACC-1")
        .await
        .unwrap()
        .expect("profile should exist");

    assert_eq!(profile.policy_count, 2);
    assert!((profile.total_gross_premium - 1_500.0).abs() < 1e-9);
    // missing net premium aggregates as zero, not as an error
    assert!((profile.total_net_premium - 900.0).abs() < 1e-9);
    assert_eq!(profile.products, vec!["KASKO", "TRAFİK"]);
    // repeated plate collapsed to one entry
    assert_eq!(profile.plates, vec!["34 ABC 123"]);
    assert_eq!(
        profile.first_policy_date,
        NaiveDate::from_ymd_opt(2023, 3, 20)
    );
    assert_eq!(
        profile.last_policy_date,
        NaiveDate::from_ymd_opt(2024, 3, 20)
    );
}

#[tokio::test]
async fn test_rebuild_preserves_ai_tags() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        insert_policy_row(
            &conn, "ACC-1", "12345678901", "AYŞE GÜL",
            Some(1_000.0), Some(900.0), Some("KASKO"), None, Some("2023-03-20"),
        );
    }

    let repo = CustomerProfileRepositoryImpl::new(&db_path).unwrap();
    repo.rebuild_profiles().await.unwrap();

    // an external collaborator writes tags between rebuilds
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute(
            "UPDATE customer_profile SET ai_tags = ?1 WHERE account_code = 'ACC-1'",
            ["[\"sadik-musteri\"]"],
        )
        .unwrap();
    }

    repo.rebuild_profiles().await.unwrap();

    let profile = repo.get_profile("ACC-1").await.unwrap().unwrap();
    assert_eq!(profile.ai_tags.as_deref(), Some("[\"sadik-musteri\"]"));
}

#[tokio::test]
async fn test_rebuild_drops_stale_profiles() {
    logging::init_test();
    let (_temp_db, db_path) = test_helpers::create_test_db().expect("Failed to create test db");

    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        insert_policy_row(
            &conn, "ACC-GONE", "11111111111", "ESKİ MÜŞTERİ",
            Some(100.0), Some(90.0), None, None, None,
        );
    }

    let repo = CustomerProfileRepositoryImpl::new(&db_path).unwrap();
    assert_eq!(repo.rebuild_profiles().await.unwrap(), 1);

    // the backing policy rows disappear (e.g. a corrective re-import)
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute("DELETE FROM policy_record", []).unwrap();
    }

    assert_eq!(repo.rebuild_profiles().await.unwrap(), 0);
    assert!(repo.get_profile("ACC-GONE").await.unwrap().is_none());
}
