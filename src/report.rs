use chrono::NaiveDateTime;

use crate::aggregator::AggregatedReport;
use crate::config::ReportConfig;
use crate::models::Category;

pub const TRUNCATION_SUFFIX: &str = "\n\n... (message truncated)";

/// Upper bound on the star glyphs drawn next to a product; counts are never capped.
pub const MAX_INTENSITY: u64 = 5;

const VENDORS_PER_PRODUCT: usize = 2;
const LINKED_PRODUCTS: usize = 3;

/// Per-run values the formatter needs besides the aggregated data.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_at: NaiveDateTime,
    pub categories: Vec<Category>,
}

/// Renders an [`AggregatedReport`] as Telegram HTML.
///
/// The header and summary always survive; when the message is over the
/// configured cap, whole lines are dropped from the tail and
/// [`TRUNCATION_SUFFIX`] is appended.
pub struct ReportFormatter {
    config: ReportConfig,
}

impl ReportFormatter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn format(&self, report: &AggregatedReport, ctx: &ReportContext) -> String {
        let head = [self.header(ctx), self.summary(report)].concat();

        let sections: Vec<String> = if report.all_failed() {
            vec![
                self.all_failed(report),
                self.failed(report),
                self.footer(ctx),
            ]
        } else {
            vec![
                self.top_products(report),
                self.top_vendors(report),
                self.statistics(report),
                self.links(report),
                self.failed(report),
                self.footer(ctx),
            ]
        };

        fit_to_length(&head, &sections.concat(), self.config.max_length)
    }

    fn header(&self, ctx: &ReportContext) -> String {
        let categories = ctx
            .categories
            .iter()
            .map(Category::label)
            .collect::<Vec<_>>()
            .join(" + ");

        let mut out = format!("<b>🏛️ {}", escape_html(&self.config.title));
        if !categories.is_empty() {
            out.push_str(&format!(" - {}", categories));
        }
        out.push_str("</b>\n");
        out.push_str(&format!("⏰ {}\n", ctx.generated_at.format("%d.%m.%Y %H:%M")));
        out
    }

    fn summary(&self, report: &AggregatedReport) -> String {
        let mut out = format!(
            "📦 {}/{} products scanned\n🏪 {} vendors found\n",
            report.success_count,
            report.catalog_count,
            report.vendor_count()
        );
        if report.failed_count() > 0 {
            out.push_str(&format!("❌ {} failed\n", report.failed_count()));
        }
        out.push('\n');
        out
    }

    fn all_failed(&self, report: &AggregatedReport) -> String {
        if report.catalog_count == 0 {
            "<i>⚠️ No products were selected for this run</i>\n\n".to_string()
        } else {
            format!(
                "<i>⚠️ All {} product scans failed</i>\n\n",
                report.catalog_count
            )
        }
    }

    fn top_products(&self, report: &AggregatedReport) -> String {
        let mut out = String::from("<b>🏆 TOP PRODUCTS:</b>\n");
        let mut any = false;

        for (i, result) in report.available().take(self.config.top_products).enumerate() {
            any = true;
            let count = result.total_count.unwrap_or_default();
            out.push_str(&format!(
                "{}. <b>{}</b>: {} {} {}\n",
                i + 1,
                escape_html(&result.product_name),
                count,
                plural(count, "offer", "offers"),
                intensity(count)
            ));

            let vendors: Vec<String> = result
                .vendor_counts
                .ranked()
                .into_iter()
                .take(VENDORS_PER_PRODUCT)
                .map(|(name, _)| escape_html(&name))
                .collect();
            if !vendors.is_empty() {
                out.push_str(&format!("   <i>{}</i>\n", vendors.join(", ")));
            }
        }

        if !any {
            out.push_str("<i>⚠️ No product is currently listed by a known vendor</i>\n");
        }
        out.push('\n');
        out
    }

    fn top_vendors(&self, report: &AggregatedReport) -> String {
        if report.vendor_ranking.is_empty() {
            return String::new();
        }

        let mut out = String::from("<b>👑 TOP VENDORS:</b>\n");
        for (name, count) in report.vendor_ranking.iter().take(self.config.top_vendors) {
            out.push_str(&format!(
                "• {}: <b>{}</b> {}\n",
                escape_html(name),
                count,
                plural(*count, "offer", "offers")
            ));
        }
        out.push('\n');
        out
    }

    fn statistics(&self, report: &AggregatedReport) -> String {
        let mut out = String::from("<b>📊 STATISTICS:</b>\n");
        out.push_str(&format!(
            "• Available products: {}/{}\n",
            report.available_count, report.success_count
        ));
        if let Some(best) = &report.best {
            out.push_str(&format!(
                "• Highest: {} ({})\n",
                escape_html(&best.name),
                best.count
            ));
        }
        if let Some(lowest) = &report.lowest_available {
            out.push_str(&format!(
                "• Lowest available: {} ({})\n",
                escape_html(&lowest.name),
                lowest.count
            ));
        }
        out.push_str(&format!(
            "• Total offers: <b>{}</b>\n\n",
            report.total_occurrences
        ));
        out
    }

    fn links(&self, report: &AggregatedReport) -> String {
        if !self.config.show_links || report.available_count == 0 {
            return String::new();
        }

        let mut out = String::from("<b>🔗 Top products:</b>\n");
        for result in report.available().take(LINKED_PRODUCTS) {
            out.push_str(&format!(
                "• {}:\n  {}\n",
                escape_html(&result.product_name),
                escape_html(&result.url)
            ));
        }
        out.push('\n');
        out
    }

    fn failed(&self, report: &AggregatedReport) -> String {
        if report.failed.is_empty() {
            return String::new();
        }

        let mut out = String::from("<b>❌ FAILED:</b>\n");
        for result in &report.failed {
            match &result.error {
                Some(error) => out.push_str(&format!(
                    "• {} ({})\n",
                    escape_html(&result.product_name),
                    escape_html(error)
                )),
                None => out.push_str(&format!("• {}\n", escape_html(&result.product_name))),
            }
        }
        out.push('\n');
        out
    }

    fn footer(&self, ctx: &ReportContext) -> String {
        format!("#GoldWatch #{}", ctx.generated_at.format("%Y%m%d_%H"))
    }
}

/// Joins `head` and `tail`, keeping the result within `cap` characters.
///
/// Cuts only at line boundaries so no HTML tag is left open. `head` comes
/// first and survives whole whenever it fits in the cap less the suffix;
/// [`AppConfig::validate`](crate::config::AppConfig::validate) bounds the
/// title so the rendered head always does.
pub fn fit_to_length(head: &str, tail: &str, cap: usize) -> String {
    if char_len(head) + char_len(tail) <= cap {
        return [head, tail].concat();
    }

    let suffix_len = char_len(TRUNCATION_SUFFIX);
    if cap < suffix_len {
        return TRUNCATION_SUFFIX.chars().take(cap).collect();
    }
    let budget = cap - suffix_len;

    let mut out = String::new();
    let mut used = 0;
    for line in head.split_inclusive('\n').chain(tail.split_inclusive('\n')) {
        let len = char_len(line);
        if used + len > budget {
            break;
        }
        out.push_str(line);
        used += len;
    }

    let mut out = out.trim_end_matches('\n').to_string();
    out.push_str(TRUNCATION_SUFFIX);
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn intensity(count: u64) -> String {
    "★".repeat(count.min(MAX_INTENSITY) as usize)
}

fn plural(count: u64, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::models::{ScrapeResult, VendorTally};
    use chrono::NaiveDate;
    use rstest::rstest;

    fn ctx() -> ReportContext {
        ReportContext {
            generated_at: NaiveDate::from_ymd_opt(2026, 10, 15)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            categories: vec![Category::Coins],
        }
    }

    fn ok(name: &str, vendors: &[(&str, u64)]) -> ScrapeResult {
        let tally: VendorTally = vendors.iter().map(|(n, c)| (n.to_string(), *c)).collect();
        ScrapeResult::success(name, &format!("https://www.gold.de/{}/", name), tally)
    }

    fn failed(name: &str) -> ScrapeResult {
        ScrapeResult::failed(name, &format!("https://www.gold.de/{}/", name), "request timed out")
    }

    fn formatter() -> ReportFormatter {
        ReportFormatter::new(ReportConfig::default())
    }

    #[test]
    fn test_header_and_summary() {
        let report = aggregate(&[ok("P1", &[("Foo", 3), ("Bar", 1)]), failed("P2")]);
        let text = formatter().format(&report, &ctx());

        assert!(text.starts_with("<b>🏛️ Availability Report - COINS</b>\n⏰ 15.10.2026 09:05\n"));
        assert!(text.contains("1/2 products scanned"));
        assert!(text.contains("2 vendors found"));
        assert!(text.contains("❌ 1 failed"));
        assert!(text.ends_with("#GoldWatch #20261015_09"));
    }

    #[test]
    fn test_failed_product_not_in_ranking() {
        let report = aggregate(&[ok("P1", &[("Foo", 3), ("Bar", 1)]), failed("P2")]);
        let text = formatter().format(&report, &ctx());

        let ranking = text
            .split("<b>🏆 TOP PRODUCTS:</b>\n")
            .nth(1)
            .and_then(|rest| rest.split("\n\n").next())
            .unwrap();
        assert!(ranking.contains("1. <b>P1</b>: 4 offers ★★★★"));
        assert!(ranking.contains("<i>Foo, Bar</i>"));
        assert!(!ranking.contains("P2"));
        assert!(text.contains("• P2 (request timed out)"));
    }

    #[test]
    fn test_intensity_is_capped() {
        let report = aggregate(&[ok("Big", &[("Foo", 40)])]);
        let text = formatter().format(&report, &ctx());

        assert!(text.contains("<b>Big</b>: 40 offers ★★★★★\n"));
        assert!(!text.contains("★★★★★★"));
    }

    #[test]
    fn test_statistics_section() {
        let report = aggregate(&[
            ok("Big", &[("Foo", 7)]),
            ok("Small", &[("Bar", 1)]),
            ok("Empty", &[]),
        ]);
        let text = formatter().format(&report, &ctx());

        assert!(text.contains("3/3 products scanned"));
        assert!(text.contains("• Available products: 2/3"));
        assert!(text.contains("• Highest: Big (7)"));
        assert!(text.contains("• Lowest available: Small (1)"));
        assert!(text.contains("• Total offers: <b>8</b>"));
        assert!(text.contains("• Bar: <b>1</b> offer\n"));
        assert!(!text.contains("Empty:"));
    }

    #[test]
    fn test_all_failed_message() {
        let report = aggregate(&[failed("A"), failed("B")]);
        let text = formatter().format(&report, &ctx());

        assert!(text.contains("0/2 products scanned"));
        assert!(text.contains("All 2 product scans failed"));
        assert!(!text.contains("TOP PRODUCTS"));
        assert!(text.contains("• A (request timed out)"));
    }

    #[test]
    fn test_nothing_available() {
        let report = aggregate(&[ok("Empty", &[])]);
        let text = formatter().format(&report, &ctx());

        assert!(text.contains("No product is currently listed"));
        assert!(!text.contains("Lowest available"));
        assert!(!text.contains("🔗"));
    }

    #[test]
    fn test_top_k_limits() {
        let results: Vec<ScrapeResult> = (0..10)
            .map(|i| ok(&format!("Item{}", i), &[(format!("V{}", i).as_str(), 10 - i as u64)]))
            .collect();
        let report = aggregate(&results);
        let formatter = ReportFormatter::new(ReportConfig {
            top_products: 3,
            top_vendors: 2,
            show_links: false,
            ..ReportConfig::default()
        });
        let text = formatter.format(&report, &ctx());

        assert!(text.contains("3. <b>Item2</b>"));
        assert!(!text.contains("4. <b>Item3</b>"));
        assert!(text.contains("• V1: <b>9</b>"));
        assert!(!text.contains("• V2: <b>8</b>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let report = aggregate(&[ok("Gold & <Silver>", &[("A&B", 1)])]);
        let text = formatter().format(&report, &ctx());

        assert!(text.contains("Gold &amp; &lt;Silver&gt;"));
        assert!(text.contains("A&amp;B"));
    }

    #[rstest]
    #[case(200)]
    #[case(500)]
    #[case(1000)]
    #[case(3800)]
    fn test_truncation_law(#[case] cap: usize) {
        let results: Vec<ScrapeResult> = (0..120)
            .map(|i| {
                let mut r = ok(
                    &format!("Very long product name number {} with extra words", i),
                    &[(format!("Vendor with a long display name {}", i).as_str(), i as u64 + 1)],
                );
                if i % 3 == 0 {
                    r = failed(&r.product_name);
                }
                r
            })
            .collect();
        let report = aggregate(&results);
        let formatter = ReportFormatter::new(ReportConfig {
            max_length: cap,
            top_products: 100,
            top_vendors: 100,
            ..ReportConfig::default()
        });
        let text = formatter.format(&report, &ctx());

        assert!(text.chars().count() <= cap);
        assert!(text.ends_with(TRUNCATION_SUFFIX));
        assert!(text.starts_with("<b>🏛️ Availability Report - COINS</b>"));
        assert!(text.contains("products scanned"));
    }

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(fit_to_length("head\n", "tail\n", 100), "head\ntail\n");
    }

    #[test]
    fn test_fit_drops_whole_tail_lines() {
        let text = fit_to_length("HEAD\n", &"line of text\n".repeat(20), 80);

        assert!(text.chars().count() <= 80);
        assert!(text.starts_with("HEAD\nline of text\n"));
        assert!(text.ends_with(TRUNCATION_SUFFIX));
        assert!(!text.contains("line of te\n"));
    }

    #[test]
    fn test_fit_oversized_head_keeps_whole_lines() {
        let text = fit_to_length("<b>short</b>\n<b>much longer second line</b>\n", "", 40);

        assert!(text.chars().count() <= 40);
        assert_eq!(text, format!("<b>short</b>{}", TRUNCATION_SUFFIX));
    }

    fn tags_balanced(text: &str) -> bool {
        ["b", "i"].iter().all(|tag| {
            text.matches(&format!("<{}>", tag)).count() == text.matches(&format!("</{}>", tag)).count()
        })
    }

    #[test]
    fn test_longest_title_keeps_head_at_smallest_cap() {
        // many failures so the tail must be cut, three categories for the widest header
        let results: Vec<ScrapeResult> = (0..1000)
            .map(|i| {
                if i % 2 == 0 {
                    failed(&format!("Product {}", i))
                } else {
                    ok(&format!("Product {}", i), &[(format!("Vendor {}", i).as_str(), 1)])
                }
            })
            .collect();
        let report = aggregate(&results);
        let formatter = ReportFormatter::new(ReportConfig {
            title: "T".repeat(crate::config::MAX_TITLE_CHARS),
            max_length: *crate::config::MAX_LENGTH_RANGE.start(),
            ..ReportConfig::default()
        });
        let ctx = ReportContext {
            categories: Category::ALL.to_vec(),
            ..ctx()
        };
        let text = formatter.format(&report, &ctx);

        assert!(text.chars().count() <= 200);
        assert!(text.starts_with(&format!("<b>🏛️ {} - PRIORITY + COINS + BARS</b>\n", "T".repeat(40))));
        assert!(text.contains("500/1000 products scanned"));
        assert!(text.contains("500 vendors found"));
        assert!(text.contains("❌ 500 failed"));
        assert!(text.ends_with(TRUNCATION_SUFFIX));
        assert!(tags_balanced(&text));
    }

    #[test]
    fn test_overlong_title_never_leaves_open_tag() {
        let report = aggregate(&[ok("P1", &[("Foo", 3)])]);
        let formatter = ReportFormatter::new(ReportConfig {
            title: "T".repeat(250),
            max_length: 200,
            ..ReportConfig::default()
        });
        let text = formatter.format(&report, &ctx());

        assert!(text.chars().count() <= 200);
        assert!(tags_balanced(&text));
    }
}
