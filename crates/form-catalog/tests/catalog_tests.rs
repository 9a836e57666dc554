use form_catalog::Form;
use form_engine::{plan, Direction, FormatMode, RenderRequest};
use pretty_assertions::assert_eq;

#[test]
fn test_customer_info_table_loads() {
    let spec = Form::CustomerInfo.spec().unwrap();
    assert_eq!(spec.name, "customer-info");
    assert!((spec.page_width - 595.28).abs() < 1e-9);
    assert!((spec.page_height - 841.89).abs() < 1e-9);
}

#[test]
fn test_personal_financing_table_loads() {
    let spec = Form::PersonalFinancing.spec().unwrap();
    assert_eq!(spec.name, "personal-financing");
}

#[test]
fn test_ic_number_field_shape() {
    let spec = Form::CustomerInfo.spec().unwrap();
    let ic = spec.field("ic_number").unwrap();
    assert_eq!(ic.mode, FormatMode::IdNumber);
    assert_eq!(ic.box_count, 14);
    assert_eq!(ic.capacity(), Some(12));
}

#[test]
fn test_coordinates_are_flipped_to_pdf_space() {
    let spec = Form::CustomerInfo.spec().unwrap();
    // Authored at y=316 from the top of an 841.89pt page
    let origin = spec.field("ic_number").unwrap().origin.unwrap();
    assert_eq!(origin.x, 52.0);
    assert!((origin.y - (841.89 - 316.0)).abs() < 1e-9);

    let gender = spec.field("gender").unwrap();
    let lelaki = gender.options.get("Lelaki").unwrap();
    assert!((lelaki.y - (841.89 - 539.0)).abs() < 1e-9);
}

#[test]
fn test_currency_fields_share_grid_shape() {
    let spec = Form::PersonalFinancing.spec().unwrap();
    for id in [
        "monthly_salary",
        "spouse_income",
        "other_income",
        "total_income",
        "living_expenses",
        "other_expenses",
        "total_expenses",
        "monthly_installments",
        "house_rent",
        "net_income",
    ] {
        let field = spec.field(id).unwrap();
        assert_eq!(field.mode, FormatMode::DecimalCurrency, "{id}");
        assert_eq!(field.box_count, 9, "{id}");
        assert_eq!(field.capacity(), Some(7), "{id}");
        assert_eq!(field.direction, Direction::Rtl, "{id}");
    }
}

#[test]
fn test_reference_phones_use_digit_probe() {
    let spec = Form::PersonalFinancing.spec().unwrap();
    let phone = spec.field("reference_mobile_phone").unwrap();
    assert_eq!(
        phone.direction,
        Direction::ByDigit {
            index: 1,
            value: '1'
        }
    );
}

#[test]
fn test_customer_info_fill_plans_cleanly() {
    let spec = Form::CustomerInfo.spec().unwrap();
    let request: RenderRequest = [
        ("ic_number", "920315-10-5438"),
        ("birth_date", "15/03/1992"),
        ("name", "Ahmad Fariz bin Abdullah"),
        ("gender", "Lelaki"),
        ("race", "Lain-lain"),
        ("race_other", "Serani"),
        ("tel_mobile", "0123456789"),
        ("email", "ahmad.fariz@email.com"),
        ("home_postcode", "50100"),
    ]
    .into_iter()
    .collect();

    let placements = plan(&spec, &request).unwrap();
    assert!(!placements.is_empty());
    // The email field keeps its case
    assert!(placements.iter().any(|p| p.text == "@"));
    assert!(placements.iter().any(|p| p.text == "a"));
    // The IC grouping spaces are not printed
    let ic_field = spec.field("ic_number").unwrap();
    let origin = ic_field.origin.unwrap();
    let ic_glyphs = placements
        .iter()
        .filter(|p| (p.y - origin.y).abs() < 1e-9 && p.x >= origin.x)
        .count();
    assert_eq!(ic_glyphs, 12);
}

#[test]
fn test_personal_financing_fill_plans_cleanly() {
    let spec = Form::PersonalFinancing.spec().unwrap();
    let request: RenderRequest = [
        ("financing_amount", "50000"),
        ("tenure_months", "60"),
        ("membership_number", "7712345"),
        ("monthly_salary", "5000"),
        ("net_income", "3500.50"),
        ("repayment_method", "Tunai / Cash"),
        ("bank1_name", "Bank Rakyat"),
    ]
    .into_iter()
    .collect();

    let placements = plan(&spec, &request).unwrap();
    // Thousands separator of the financing amount is drawn in its gap box
    let amount = spec.field("financing_amount").unwrap();
    let origin = amount.origin.unwrap();
    let comma = placements
        .iter()
        .find(|p| p.text == "," && (p.y - origin.y).abs() < 1e-9)
        .unwrap();
    assert!((comma.x - (origin.x + 3.0 * 12.4)).abs() < 1e-9);
}

#[test]
fn test_conditional_field_requires_parent_value() {
    let spec = Form::CustomerInfo.spec().unwrap();

    let mut request = RenderRequest::new();
    request.set("race", "Cina");
    request.set("race_other", "Serani");

    let skipped = plan(&spec, &request).unwrap();
    // The tick for "Cina" renders, the conditional text does not
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].text, "/");
}
