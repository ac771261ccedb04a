use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write as _;
use techscan_core::{Fundamentals, IndicatorSnapshot, Lookback};
use techscan_indicators::IndicatorConfig;

/// The answers the reasoning service must choose from.
pub const RECOMMENDATIONS: [&str; 5] = ["strong sell", "sell", "neutral", "buy", "strong buy"];

/// Valuation verdicts.
pub const VALUATIONS: [&str; 3] = ["undervalued", "overvalued", "fair"];

/// Two decimals, half away from zero; `n/a` for an undefined value.
pub fn format_value(value: Option<Decimal>) -> String {
    match value {
        Some(v) => {
            let rounded = v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.2}", rounded)
        }
        None => "n/a".to_string(),
    }
}

/// Up to four decimals with trailing zeros dropped; `n/a` when missing.
/// Fundamentals mix ratios (`0.0044`) with absolute amounts (`3229000000000`).
pub fn format_metric(value: Option<Decimal>) -> String {
    match value {
        Some(v) => v
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
        None => "n/a".to_string(),
    }
}

fn choice_list(choices: &[&str]) -> String {
    choices
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the technical-analyst prompt from the latest indicator values.
pub fn technical_prompt(
    ticker: &str,
    period: Lookback,
    windows: &IndicatorConfig,
    snapshot: &IndicatorSnapshot,
) -> String {
    let v = format_value;
    let mut prompt = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        prompt,
        "You are a technical market analyst. Here are the latest technical indicators for {} (period: {}):",
        ticker, period
    );
    let _ = writeln!(prompt, "Short-term SMA ({}): {}", windows.sma_short, v(snapshot.sma_short));
    let _ = writeln!(prompt, "Long-term SMA ({}): {}", windows.sma_long, v(snapshot.sma_long));
    let _ = writeln!(prompt, "RSI ({}): {}", windows.rsi, v(snapshot.rsi));
    let _ = writeln!(
        prompt,
        "MACD: {}, MACD Signal: {}",
        v(snapshot.macd),
        v(snapshot.macd_signal)
    );
    let _ = writeln!(
        prompt,
        "Bollinger Upper: {}, Bollinger Lower: {}",
        v(snapshot.bollinger_upper),
        v(snapshot.bollinger_lower)
    );
    let _ = writeln!(
        prompt,
        "Stochastic %K: {}, %D: {}",
        v(snapshot.stoch_k),
        v(snapshot.stoch_d)
    );
    let _ = writeln!(prompt, "Current Close: {}", v(snapshot.close));
    prompt.push('\n');

    let _ = write!(
        prompt,
        "Based on these technical indicators, is it optimal to buy the stock now? \
         After reasoning, you must also include a clear answer among [{}].",
        choice_list(&RECOMMENDATIONS)
    );
    prompt
}

/// Build the valuation-analyst prompt from a company's fundamentals.
pub fn valuation_prompt(f: &Fundamentals) -> String {
    let v = format_metric;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "You are a market analyst specializing in stock valuation.");
    let _ = writeln!(prompt, "Here is the data for {} ({}):", f.short_name, f.ticker);
    let _ = writeln!(prompt, "Sector: {}, Industry: {}", f.sector, f.industry);
    let _ = writeln!(
        prompt,
        "Current Price: {}, Market Cap: {}",
        v(f.current_price),
        v(f.market_cap)
    );
    let _ = writeln!(
        prompt,
        "P/E: {}, Fwd P/E: {}, P/B: {}, P/S: {}, EV/EBITDA: {}, PEG: {}",
        v(f.trailing_pe),
        v(f.forward_pe),
        v(f.price_to_book),
        v(f.price_to_sales_trailing12_months),
        v(f.enterprise_to_ebitda),
        v(f.peg_ratio)
    );
    let _ = writeln!(prompt, "EPS: {}, Fwd EPS: {}", v(f.trailing_eps), v(f.forward_eps));
    let _ = writeln!(prompt, "ROE: {}, ROA: {}", v(f.return_on_equity), v(f.return_on_assets));
    let _ = writeln!(
        prompt,
        "Net Margin: {}, Gross Margin: {}, Operating Margin: {}",
        v(f.profit_margins),
        v(f.gross_margins),
        v(f.operating_margins)
    );
    let _ = writeln!(
        prompt,
        "Revenue Growth: {}, Earnings Growth: {}, Earnings Qtr Growth: {}, Revenue Qtr Growth: {}",
        v(f.revenue_growth),
        v(f.earnings_growth),
        v(f.earnings_quarterly_growth),
        v(f.revenue_quarterly_growth)
    );
    let _ = writeln!(
        prompt,
        "Dividend Yield: {}, Payout Ratio: {}",
        v(f.dividend_yield),
        v(f.payout_ratio)
    );
    let _ = writeln!(
        prompt,
        "Debt/Equity: {}, Current Ratio: {}, Quick Ratio: {}",
        v(f.debt_to_equity),
        v(f.current_ratio),
        v(f.quick_ratio)
    );
    let _ = writeln!(prompt, "Total Cash: {}, Total Debt: {}", v(f.total_cash), v(f.total_debt));
    let _ = writeln!(
        prompt,
        "Free Cash Flow: {}, Operating Cash Flow: {}, CapEx: {}",
        v(f.free_cashflow),
        v(f.operating_cashflow),
        v(f.capital_expenditures)
    );
    let _ = writeln!(
        prompt,
        "52W High: {}, 52W Low: {}",
        v(f.fifty_two_week_high),
        v(f.fifty_two_week_low)
    );
    let _ = writeln!(
        prompt,
        "Volume: {}, Avg Volume: {}, Shares Out: {}",
        v(f.volume),
        v(f.average_volume),
        v(f.shares_outstanding)
    );
    prompt.push('\n');

    let _ = write!(
        prompt,
        "Based on the above data, is the stock undervalued or overvalued relative to its \
         earnings, assets, and growth? Limit your response to 200 words and include a clear \
         answer among [{}].",
        choice_list(&VALUATIONS)
    );
    prompt
}

/// The last of `choices` mentioned in an answer, if any.
///
/// A longer choice ending at the same place wins, so "strong buy" beats the
/// "buy" it contains.
pub fn extract_choice(answer: &str, choices: &[&'static str]) -> Option<&'static str> {
    let lower = answer.to_lowercase();
    let mut best: Option<(usize, &'static str)> = None;
    for &choice in choices {
        if let Some(pos) = lower.rfind(choice) {
            let end = pos + choice.len();
            let better = match best {
                None => true,
                Some((best_end, best_choice)) => {
                    end > best_end || (end == best_end && choice.len() > best_choice.len())
                }
            };
            if better {
                best = Some((end, choice));
            }
        }
    }
    best.map(|(_, choice)| choice)
}

pub fn extract_recommendation(answer: &str) -> Option<&'static str> {
    extract_choice(answer, &RECOMMENDATIONS)
}

pub fn extract_valuation(answer: &str) -> Option<&'static str> {
    extract_choice(answer, &VALUATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            close: Some(dec!(210.62)),
            sma_short: Some(dec!(205.1234)),
            sma_long: Some(dec!(193.996)),
            rsi: Some(dec!(61.005)),
            macd: Some(dec!(-1.2)),
            macd_signal: Some(dec!(-0.5)),
            bollinger_upper: Some(dec!(220)),
            bollinger_lower: Some(dec!(190.4449)),
            stoch_k: Some(dec!(77.7777)),
            stoch_d: None,
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(dec!(1.005))), "1.01");
        assert_eq!(format_value(Some(dec!(220))), "220.00");
        assert_eq!(format_value(Some(dec!(-1.2))), "-1.20");
        assert_eq!(format_value(None), "n/a");
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = technical_prompt(
            "AAPL",
            Lookback::Months(6),
            &IndicatorConfig::default(),
            &snapshot(),
        );
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(
            lines[0],
            "You are a technical market analyst. Here are the latest technical indicators for AAPL (period: 6mo):"
        );
        assert_eq!(lines[1], "Short-term SMA (20): 205.12");
        assert_eq!(lines[2], "Long-term SMA (50): 194.00");
        assert_eq!(lines[3], "RSI (14): 61.01");
        assert_eq!(lines[4], "MACD: -1.20, MACD Signal: -0.50");
        assert_eq!(lines[5], "Bollinger Upper: 220.00, Bollinger Lower: 190.44");
        assert_eq!(lines[6], "Stochastic %K: 77.78, %D: n/a");
        assert_eq!(lines[7], "Current Close: 210.62");
        assert_eq!(lines[8], "");
        assert!(lines[9].ends_with("['strong sell', 'sell', 'neutral', 'buy', 'strong buy']."));
    }

    #[test]
    fn test_extract_recommendation() {
        assert_eq!(extract_recommendation("Overall: Strong Buy."), Some("strong buy"));
        assert_eq!(extract_recommendation("Not a sell. Final answer: neutral"), Some("neutral"));
        assert_eq!(extract_recommendation("I would buy"), Some("buy"));
        assert_eq!(extract_recommendation("no opinion"), None);
    }

    #[test]
    fn test_extract_valuation() {
        assert_eq!(extract_valuation("Verdict: Undervalued."), Some("undervalued"));
        assert_eq!(extract_valuation("Not overvalued; I'd call it fair"), Some("fair"));
        assert_eq!(extract_valuation("buy"), None);
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(dec!(0.0044))), "0.0044");
        assert_eq!(format_metric(Some(dec!(32.750))), "32.75");
        assert_eq!(format_metric(Some(dec!(3229000000000))), "3229000000000");
        assert_eq!(format_metric(Some(dec!(1.23456))), "1.2346");
        assert_eq!(format_metric(None), "n/a");
    }

    #[test]
    fn test_valuation_prompt_layout() {
        let f = Fundamentals {
            ticker: "AAPL".to_string(),
            short_name: "Apple Inc.".to_string(),
            sector: "Technology".to_string(),
            industry: "Consumer Electronics".to_string(),
            current_price: Some(dec!(210.62)),
            trailing_pe: Some(dec!(32.75)),
            dividend_yield: Some(dec!(0.0044)),
            ..Default::default()
        };
        let prompt = valuation_prompt(&f);
        let lines: Vec<&str> = prompt.lines().collect();
        assert_eq!(lines[0], "You are a market analyst specializing in stock valuation.");
        assert_eq!(lines[1], "Here is the data for Apple Inc. (AAPL):");
        assert_eq!(lines[2], "Sector: Technology, Industry: Consumer Electronics");
        assert_eq!(lines[3], "Current Price: 210.62, Market Cap: n/a");
        assert!(lines[4].starts_with("P/E: 32.75, Fwd P/E: n/a"));
        assert_eq!(lines[9], "Dividend Yield: 0.0044, Payout Ratio: n/a");
        assert_eq!(lines[15], "");
        assert!(lines[16].ends_with("['undervalued', 'overvalued', 'fair']."));
    }
}
