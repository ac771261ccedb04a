use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Company profile and valuation metrics for one ticker.
///
/// Field names follow the camelCase keys of a Yahoo-style quote summary
/// (`currentPrice`, `trailingPE`, ...), so an exported JSON object can be
/// read as is. Every metric is optional; absent or `null` keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fundamentals {
    pub ticker: String,
    pub short_name: String,
    pub sector: String,
    pub industry: String,

    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<Decimal>,
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub price_to_sales_trailing12_months: Option<Decimal>,
    pub enterprise_to_ebitda: Option<Decimal>,
    pub peg_ratio: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub return_on_equity: Option<Decimal>,
    pub return_on_assets: Option<Decimal>,
    pub profit_margins: Option<Decimal>,
    pub gross_margins: Option<Decimal>,
    pub operating_margins: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub earnings_growth: Option<Decimal>,
    pub earnings_quarterly_growth: Option<Decimal>,
    pub revenue_quarterly_growth: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub payout_ratio: Option<Decimal>,
    pub debt_to_equity: Option<Decimal>,
    pub current_ratio: Option<Decimal>,
    pub quick_ratio: Option<Decimal>,
    pub total_cash: Option<Decimal>,
    pub total_debt: Option<Decimal>,
    pub free_cashflow: Option<Decimal>,
    pub operating_cashflow: Option<Decimal>,
    pub capital_expenditures: Option<Decimal>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub average_volume: Option<Decimal>,
    pub shares_outstanding: Option<Decimal>,
}

impl Fundamentals {
    /// Every metric with a display label, in report order.
    pub fn metrics(&self) -> [(&'static str, Option<Decimal>); 34] {
        [
            ("Current Price", self.current_price),
            ("Market Cap", self.market_cap),
            ("P/E", self.trailing_pe),
            ("Fwd P/E", self.forward_pe),
            ("P/B", self.price_to_book),
            ("P/S", self.price_to_sales_trailing12_months),
            ("EV/EBITDA", self.enterprise_to_ebitda),
            ("PEG", self.peg_ratio),
            ("EPS", self.trailing_eps),
            ("Fwd EPS", self.forward_eps),
            ("ROE", self.return_on_equity),
            ("ROA", self.return_on_assets),
            ("Net Margin", self.profit_margins),
            ("Gross Margin", self.gross_margins),
            ("Operating Margin", self.operating_margins),
            ("Revenue Growth", self.revenue_growth),
            ("Earnings Growth", self.earnings_growth),
            ("Earnings Qtr Growth", self.earnings_quarterly_growth),
            ("Revenue Qtr Growth", self.revenue_quarterly_growth),
            ("Dividend Yield", self.dividend_yield),
            ("Payout Ratio", self.payout_ratio),
            ("Debt/Equity", self.debt_to_equity),
            ("Current Ratio", self.current_ratio),
            ("Quick Ratio", self.quick_ratio),
            ("Total Cash", self.total_cash),
            ("Total Debt", self.total_debt),
            ("Free Cash Flow", self.free_cashflow),
            ("Operating Cash Flow", self.operating_cashflow),
            ("CapEx", self.capital_expenditures),
            ("52W High", self.fifty_two_week_high),
            ("52W Low", self.fifty_two_week_low),
            ("Volume", self.volume),
            ("Avg Volume", self.average_volume),
            ("Shares Out", self.shares_outstanding),
        ]
    }

    /// Number of metrics that are present.
    pub fn known_count(&self) -> usize {
        self.metrics().iter().filter(|(_, v)| v.is_some()).count()
    }
}
