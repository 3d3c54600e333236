use crate::app::App;
use crate::commands::Out;
use crate::report::{self, OutputFormat};
use crate::stats::{compute_stats, CategorySortOrder, DashboardStats};
use crate::Result;

/// Handles `kasa dashboard`: reloads the transactions, then renders the income, expense and
/// balance cards along with one bar per category that has a total above zero.
///
/// `sort` overrides the `category_sort` setting from `config.json` for this run.
pub async fn dashboard(
    app: &mut App,
    sort: Option<CategorySortOrder>,
    format: OutputFormat,
) -> Result<Out<DashboardStats>> {
    let transactions = app.reload().await?;
    let config = app.config();
    let sort = sort.unwrap_or_else(|| config.category_sort());
    let stats = compute_stats(transactions.data(), &config.categories(), sort);
    let rendered = report::render_dashboard(&stats, config.bar_base(), format)?;
    let message = format!(
        "Dashboard for {} transactions, balance {}",
        transactions.len(),
        stats.balance.with_symbol()
    );
    Ok(Out::new(message, stats).with_report(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_dashboard_demo_ledger() {
        let env = TestEnv::new().await;
        let mut app = env.demo_app().await;
        let out = dashboard(&mut app, None, OutputFormat::Table).await.unwrap();
        let stats = out.structure().unwrap();

        assert_eq!(stats.income, Amount::from(7570));
        assert_eq!(
            stats.expense,
            Amount::new(Decimal::from_str("17400.50").unwrap())
        );
        assert_eq!(
            stats.balance,
            Amount::new(Decimal::from_str("-9830.50").unwrap())
        );

        // declaration order from the default category list
        let names: Vec<&str> = stats
            .category_totals
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["Ciro/Satış", "Mutfak/Gıda", "Elektrik", "Kira", "Mal Alımı"]
        );

        let report = out.report().unwrap();
        assert!(report.contains("NET BALANCE"));
        assert!(report.contains("-9,830.50 ₺"));
    }

    #[tokio::test]
    async fn test_dashboard_descending_json() {
        let env = TestEnv::new().await;
        let mut app = env.demo_app().await;
        let out = dashboard(&mut app, Some(CategorySortOrder::Descending), OutputFormat::Json)
            .await
            .unwrap();
        let first = &out.structure().unwrap().category_totals[0];
        assert_eq!(first.name, "Kira");

        let json: serde_json::Value = serde_json::from_str(out.report().unwrap()).unwrap();
        assert_eq!(json["category_totals"][0]["name"], "Kira");
        assert_eq!(json["bar_base"], "income");
    }

    #[tokio::test]
    async fn test_dashboard_requires_login() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        assert!(dashboard(&mut app, None, OutputFormat::Table).await.is_err());
    }
}
