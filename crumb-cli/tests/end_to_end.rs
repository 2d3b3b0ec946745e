use crumb_cli::{cost_report, price_report, reprice, shopping_list};
use crumb_pricing::{PricingDefaults, PricingEdit, PricingEngine, PricingSession};
use crumb_shared::ProductId;
use crumb_store::CatalogSnapshot;
use serde_json::json;

const SUGAR: &str = "11111111-1111-4111-8111-111111111111";
const CREAM: &str = "22222222-2222-4222-8222-222222222222";
const CAKE: &str = "33333333-3333-4333-8333-333333333333";
const TRAY: &str = "44444444-4444-4444-8444-444444444444";
const PRICED: &str = "55555555-5555-4555-8555-555555555555";
const UNPRICED: &str = "66666666-6666-4666-8666-666666666666";

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn snapshot() -> CatalogSnapshot {
    let document = json!({
        "ingredients": [
            // 2.00 per unit
            { "id": SUGAR, "name": "Sugar", "unit": "g", "packageQuantity": 10, "packagePrice": "20.00" },
            // 0.50 per unit
            { "id": CREAM, "name": "Cream", "unit": "ml", "packageQuantity": 2, "packagePrice": 1 }
        ],
        "packaging": [
            { "id": TRAY, "name": "Tray", "bulkQuantity": 0, "bulkPrice": 12 }
        ],
        "recipes": [
            {
                "id": CAKE,
                "name": "Cake",
                "portions": 10,
                "baseLines": [{ "ingredientId": SUGAR, "quantity": 5 }],
                "portionLines": [{ "ingredientId": CREAM, "quantity": 1 }]
            }
        ],
        "products": [
            {
                "id": PRICED,
                "name": "Cake tray",
                "recipeLines": [{ "recipeId": CAKE, "quantity": 10 }],
                "packagingLines": [{ "packagingId": TRAY, "quantity": 1 }]
            },
            {
                "id": UNPRICED,
                "name": "Single slice",
                "recipeLines": [{ "recipeId": CAKE, "quantity": 1 }]
            }
        ],
        "pricing": [
            {
                "productId": PRICED,
                "baseCost": 15,
                "laborCost": 0,
                "laborCostType": "fixed",
                "wastagePercentage": 0,
                "marginPercentage": 25,
                "platformFeePercentage": 10,
                "taxPercentage": 0
            }
        ],
        "productionRuns": [
            {
                "id": "77777777-7777-4777-8777-777777777777",
                "name": "Saturday",
                "items": [
                    { "recipeId": CAKE, "quantity": 2 },
                    { "recipeId": CAKE, "quantity": 1, "notes": "spare" }
                ]
            }
        ]
    });
    CatalogSnapshot::from_json(&document.to_string()).expect("Failed to load snapshot")
}

fn engine() -> PricingEngine {
    PricingEngine::new(PricingDefaults::default())
}

#[test]
fn test_ingredient_to_final_price() {
    let snapshot = snapshot();

    let costs = cost_report(&snapshot);
    let cake = &costs.recipes[0].costs;
    assert!(approx(cake.unit_cost, 1.5));
    assert!(approx(cake.total_cost, 15.0));

    let product: ProductId = PRICED.parse().unwrap();
    let report = price_report(&snapshot, &engine(), &product, false).unwrap();

    // Tray has no usable bulk quantity, so it adds nothing
    assert!(approx(report.costs.total_cost, 15.0));
    assert!(report.from_record);
    assert!(approx(report.result.selling_price, 20.0));
    assert!(approx(report.result.final_price, 22.0));
    assert!(approx(report.result.profit, 5.0));
    assert!(approx(report.result.profit_margin_percentage, 25.0));
    assert!(report.result.is_valid());
}

#[test]
fn test_unpriced_product_uses_defaults() {
    let snapshot = snapshot();
    let product: ProductId = UNPRICED.parse().unwrap();

    let report = price_report(&snapshot, &engine(), &product, false).unwrap();

    assert!(!report.from_record);
    assert!(approx(report.configuration.base_cost, 1.5));
    // Default margin of 30%, no fees
    assert!(approx(report.result.selling_price, 1.5 / 0.7));
    assert!(approx(report.result.final_price, report.result.selling_price));
}

#[test]
fn test_edit_session_and_save() {
    let snapshot = snapshot();
    let product: ProductId = PRICED.parse().unwrap();
    let record = snapshot.pricing_record(&product).unwrap();

    let mut session = PricingSession::from_record(record);
    assert!(approx(session.result().final_price, 22.0));

    session.apply(PricingEdit::SellingPrice(30.0)).unwrap();
    assert!(approx(session.result().margin_percentage, 50.0));
    assert!(approx(session.result().final_price, 33.0));

    let saved = session.save();
    assert!(approx(saved.final_price, 33.0));
    assert!(approx(saved.actual_margin, 50.0));
    assert_eq!(saved.selling_price, Some(30.0));
}

#[test]
fn test_reprice_catalog() {
    let mut snapshot = snapshot();
    let product: ProductId = PRICED.parse().unwrap();

    let outcome = reprice(&mut snapshot, true, false);

    assert_eq!(outcome.len(), 1);
    let record = snapshot.pricing_record(&product).unwrap();
    assert!(approx(record.total_unit_cost, 15.0));
    assert!(approx(record.ideal_price, 20.0));
    assert!(approx(record.final_price, 22.0));
    assert!(approx(record.unit_profit, 5.0));
    assert!(approx(record.actual_margin, 25.0));
}

#[test]
fn test_shopping_list_for_run() {
    let snapshot = snapshot();
    let list = shopping_list(&snapshot, None).unwrap();

    // Three batches of cake in total
    assert_eq!(list.lines.len(), 2);
    let sugar = list.line(&SUGAR.parse().unwrap()).unwrap();
    let cream = list.line(&CREAM.parse().unwrap()).unwrap();
    assert!(approx(sugar.total_quantity, 15.0));
    assert!(approx(cream.total_quantity, 3.0));
    assert!(approx(list.estimated_total_cost, 15.0 * 2.0 + 3.0 * 0.5));
    assert!(list.unresolved_recipes.is_empty());
}
