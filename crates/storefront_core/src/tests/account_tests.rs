use super::*;
use crate::test_support::{Call, FakeStorefront, Script};
use shared::domain::NoticeLevel;

fn fields(pairs: &[(&str, &str)]) -> FormFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn countries() -> CountryDirectory {
    CountryDirectory::from_json(
        r#"[
            {"name": "Canada", "dial_code": "+1", "code": "CA"},
            {"name": "United Kingdom", "dial_code": "+44", "code": "GB"},
            {"name": "United States", "dial_code": "+1", "code": "US"}
        ]"#,
    )
    .unwrap()
}

#[tokio::test]
async fn account_form_is_read_only_until_edit() {
    let api = FakeStorefront::new();
    let mut form = AccountInfoForm::new(fields(&[("first_name", "Ada")]));

    assert!(!form.is_editable());
    assert_eq!(form.set_field("first_name", "Grace"), Err(FormError::ReadOnly));
    let err = form.submit(&api).await.unwrap_err();
    assert!(matches!(err, ActionError::Invalid(FormError::ReadOnly)));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn account_submit_trims_and_locks_on_success() {
    let api = FakeStorefront::new();
    let mut form = AccountInfoForm::new(fields(&[("first_name", "Ada")]));

    form.begin_edit();
    form.set_field("first_name", "  Grace ").unwrap();
    let notice = form.submit(&api).await.expect("submit");

    assert_eq!(notice, Notice::success("Data updated"));
    assert!(!form.is_editable());
    assert_eq!(form.fields()["first_name"], "Grace");
    match &api.calls()[0] {
        Call::UpdateAccount(sent) => assert_eq!(sent["first_name"], "  Grace "),
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn account_submit_failure_keeps_form_editable() {
    let api = FakeStorefront::new();
    api.script([Script::Reject("Invalid form data".into())]);
    let mut form = AccountInfoForm::new(fields(&[("first_name", "Ada")]));

    form.begin_edit();
    let err = form.submit(&api).await.unwrap_err();

    assert_eq!(err.notice(), Notice::warning("Invalid form data"));
    assert!(form.is_editable());
}

#[test]
fn cancel_locks_without_reverting() {
    let mut form = AccountInfoForm::new(fields(&[("first_name", "Ada")]));
    form.begin_edit();
    form.set_field("first_name", "Grace").unwrap();
    form.cancel();

    assert!(!form.is_editable());
    assert_eq!(form.fields()["first_name"], "Grace");
}

#[tokio::test]
async fn password_change_validates_locally() {
    let api = FakeStorefront::new();

    let mut mismatch = PasswordChange::new("old", "new-secret", "new-secrte");
    let err = mismatch.submit(&api).await.unwrap_err();
    assert_eq!(err.notice().message, "Passwords does not match");

    let mut unchanged = PasswordChange::new("same", "same", "same");
    let err = unchanged.submit(&api).await.unwrap_err();
    assert_eq!(err.notice().message, "Same as current password");

    let mut empty = PasswordChange::new("old", "", "");
    assert!(matches!(
        empty.submit(&api).await.unwrap_err(),
        ActionError::Invalid(FormError::EmptyPassword)
    ));

    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn password_change_sends_backend_field_names_and_clears() {
    let api = FakeStorefront::new();
    let mut change = PasswordChange::new("old", "new-secret", "new-secret");

    let notice = change.submit(&api).await.expect("submit");

    assert_eq!(notice.message, "Password changed");
    assert_eq!(change, PasswordChange::default());
    match &api.calls()[0] {
        Call::ResetPassword(sent) => {
            assert_eq!(sent["currentPassword"], "old");
            assert_eq!(sent["newPassword"], "new-secret");
            assert_eq!(sent["confirmNewPassword"], "new-secret");
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test]
async fn password_change_keeps_input_when_backend_refuses() {
    let api = FakeStorefront::new();
    api.script([Script::Reject("Current password invalid".into())]);
    let mut change = PasswordChange::new("wrong", "new-secret", "new-secret");

    let err = change.submit(&api).await.unwrap_err();

    assert_eq!(err.notice().message, "Current password invalid");
    assert_eq!(change.current_password, "wrong");
}

#[tokio::test]
async fn create_address_appends_row_with_backend_id() {
    let api = FakeStorefront::new().with_new_address_id(12);
    let mut book = AddressBook::new(Vec::new(), countries());

    let notice = book
        .create(&api, fields(&[("city", "Toronto"), ("country", "CA")]))
        .await
        .expect("create");

    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(book.entries().len(), 1);
    assert_eq!(book.entries()[0].id, AddressId(12));
}

#[tokio::test]
async fn update_address_resolves_country_to_code() {
    let api = FakeStorefront::new();
    let mut book = AddressBook::new(
        vec![AddressEntry {
            id: AddressId(3),
            fields: fields(&[("city", "Leeds"), ("country", "GB")]),
        }],
        countries(),
    );

    book.update(&api, AddressId(3), fields(&[("city", "Boston"), ("country", "united s")]))
        .await
        .expect("update");

    match &api.calls()[0] {
        Call::UpdateAddress(request) => {
            assert_eq!(request.addr_id, AddressId(3));
            assert_eq!(request.fields["country"], "US");
        }
        other => panic!("unexpected call {other:?}"),
    }
    let entry = book.get(AddressId(3)).unwrap();
    assert_eq!(entry.fields["city"], "Boston");
    assert_eq!(entry.fields["country"], "US");
}

#[tokio::test]
async fn update_address_with_unknown_country_sends_nothing() {
    let api = FakeStorefront::new();
    let mut book = AddressBook::new(Vec::new(), countries());

    let err = book
        .update(&api, AddressId(3), fields(&[("country", "Atlantis")]))
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Invalid(FormError::UnknownCountry(ref c)) if c == "Atlantis"));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn delete_address_removes_row_only_after_success() {
    let api = FakeStorefront::new();
    api.script([Script::Unreachable]);
    let entry = AddressEntry {
        id: AddressId(5),
        fields: fields(&[("city", "Paris")]),
    };
    let mut book = AddressBook::new(vec![entry], countries());

    assert!(book.delete(&api, AddressId(5)).await.is_err());
    assert_eq!(book.entries().len(), 1);

    let notice = book.delete(&api, AddressId(5)).await.expect("delete");
    assert_eq!(notice.message, "Address deleted");
    assert!(book.entries().is_empty());
}

#[tokio::test]
async fn wishlist_toggle_reports_count() {
    let api = FakeStorefront::new().with_wish_count(3);

    let toggle = toggle_wishlist(&api, SkuId(8)).await.expect("toggle");

    assert_eq!(toggle.wish_count, Some(3));
    assert_eq!(toggle.notice.message, "Item added to wishlist");
}

#[tokio::test]
async fn wishlist_page_removes_row_on_success() {
    let api = FakeStorefront::new().with_wish_count(1);
    api.script([Script::Reject("Item does not exist".into())]);
    let mut page = WishlistPage::new(vec![SkuId(1), SkuId(2)]);

    let err = page.remove(&api, SkuId(2)).await.unwrap_err();
    assert_eq!(err.notice().message, "Item does not exist");
    assert_eq!(page.items(), &[SkuId(1), SkuId(2)]);

    page.remove(&api, SkuId(2)).await.expect("remove");
    assert_eq!(page.items(), &[SkuId(1)]);
    assert_eq!(page.wish_count(), Some(1));
}
