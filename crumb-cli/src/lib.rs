pub mod reports;

pub use reports::{
    cost_report, price_report, reprice, round_numbers, shopping_list, CostReport, PriceReport,
    ReportError,
};
