use super::*;
use rstest::rstest;

#[rstest]
#[case(CalculationStoreError::connection("refused"), "calculation store connection failed: refused")]
#[case(CalculationStoreError::query("syntax"), "calculation store query failed: syntax")]
#[case(
    CalculationStoreError::user_not_found("11111111-1111-1111-1111-111111111111"),
    "user 11111111-1111-1111-1111-111111111111 does not exist"
)]
fn calculation_store_errors_render_context(
    #[case] error: CalculationStoreError,
    #[case] expected: &str,
) {
    assert_eq!(error.to_string(), expected);
}

#[rstest]
fn duplicate_user_errors_name_the_field() {
    let error = UserPersistenceError::duplicate("email");
    assert_eq!(error.to_string(), "a user with this email already exists");
}

#[rstest]
#[tokio::test]
async fn mocked_store_reports_rollback_count() {
    let mut store = MockCalculationStore::new();
    store.expect_rollback().times(1).return_const(3_usize);
    store
        .expect_commit()
        .times(1)
        .returning(|| Err(CalculationStoreError::connection("closed")));

    assert_eq!(store.rollback(), 3);
    assert!(matches!(
        store.commit().await,
        Err(CalculationStoreError::Connection { .. })
    ));
}
