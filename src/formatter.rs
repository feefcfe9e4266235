//! Result Formatter
//!
//! Turns a [`QueryResult`] into chat-ready markdown. A single numeric cell gets a
//! phrasing chosen from the column name and the question; anything wider becomes a
//! pipe table with a row cap.

use crate::store::{CellValue, QueryResult};
use itertools::Itertools;

pub const DEFAULT_DISPLAY_LIMIT: usize = 25;

const AGE_WORDS: &[&str] = &["age", "ages"];
const MONEY_WORDS: &[&str] = &[
    "salary", "salaries", "income", "wage", "wages", "pay", "compensation", "earnings",
];
const AVERAGE_WORDS: &[&str] = &["average", "avg", "mean"];
const RATE_WORDS: &[&str] = &["rate", "rates", "percent", "percentage", "pct"];

pub struct ResultFormatter {
    display_limit: usize,
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_LIMIT)
    }
}

impl ResultFormatter {
    pub fn new(display_limit: usize) -> Self {
        Self {
            display_limit: display_limit.max(1),
        }
    }

    pub fn format(&self, result: &QueryResult, question: &str) -> String {
        if result.is_empty() {
            return "No rows returned.".to_string();
        }

        if let Some(value) = result.scalar() {
            let column = result.columns.first().map(String::as_str).unwrap_or("");
            return format_scalar(value, column, question);
        }

        self.format_table(result)
    }

    fn format_table(&self, result: &QueryResult) -> String {
        let total = result.row_count();
        let mut lines = vec![
            format!("**Results ({} rows):**", total),
            String::new(),
            format!("| {} |", result.columns.iter().join(" | ")),
            format!("|{}|", result.columns.iter().map(|_| "---").join("|")),
        ];

        for row in result.rows.iter().take(self.display_limit) {
            lines.push(format!("| {} |", row.iter().map(|cell| cell.to_string().replace('|', "\\|")).join(" | ")));
        }

        if total > self.display_limit {
            lines.push(String::new());
            lines.push(format!(
                "_Showing first {} of {} rows ({} omitted)._",
                self.display_limit,
                total,
                total - self.display_limit
            ));
        }

        lines.join("\n")
    }
}

/// Lowercase words split on punctuation and camel case, so `AVG(MonthlyIncome)`
/// yields `avg`, `monthly`, `income`.
fn words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in text.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn has_any_word(words: &[String], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.contains(&w.as_str()))
}

/// What a number measures, judged from a column name or a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Age,
    Rate,
    Money,
    Neutral,
}

fn measure_of(text: &str) -> Measure {
    let words = words(text);
    if has_any_word(&words, AGE_WORDS) {
        Measure::Age
    } else if has_any_word(&words, RATE_WORDS) || text.contains('%') {
        Measure::Rate
    } else if has_any_word(&words, MONEY_WORDS) {
        Measure::Money
    } else {
        Measure::Neutral
    }
}

fn format_scalar(value: &CellValue, column: &str, question: &str) -> String {
    let number = match value {
        CellValue::Integer(_) | CellValue::Real(_) => value.as_f64().unwrap_or_default(),
        CellValue::Text(_) | CellValue::Null => return format!("Result: {}", value),
    };

    // The column decides; the question only speaks for neutral columns.
    let column_measure = measure_of(column);
    let measure = match column_measure {
        Measure::Neutral => measure_of(question),
        named => named,
    };
    let is_average = has_any_word(&words(column), AVERAGE_WORDS) || has_any_word(&words(question), AVERAGE_WORDS);
    let is_real = matches!(value, CellValue::Real(_));

    match measure {
        Measure::Age if is_average => return format!("**Average age:** {:.2} years", number),
        Measure::Rate if column_measure == Measure::Rate && number <= 100.0 => {
            return format!("**Rate:** {:.2}%", number)
        }
        Measure::Money if is_average => return format!("**Average salary:** {}", currency(number)),
        Measure::Money if column_measure == Measure::Money => return format!("**Result:** {}", currency(number)),
        _ => {}
    }

    if is_real && !is_average && matches!(measure, Measure::Rate | Measure::Neutral) && (0.0..=100.0).contains(&number) {
        return format!("**Result:** {:.2}%", number);
    }

    match value {
        CellValue::Integer(i) if column.to_lowercase().contains("count") => {
            format!("**Count:** {}", group_thousands(&i.to_string()))
        }
        CellValue::Integer(i) => format!("**Result:** {}", group_thousands(&i.to_string())),
        _ => format!("**Result:** {}", group_thousands(&format!("{:.2}", number))),
    }
}

fn currency(amount: f64) -> String {
    let digits = group_thousands(&format!("{:.2}", amount.abs()));
    if amount < 0.0 {
        format!("-${}", digits)
    } else {
        format!("${}", digits)
    }
}

/// Insert `,` separators into the integer part of a plain decimal string.
fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let grouped = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(",");

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(column: &str, value: CellValue) -> QueryResult {
        QueryResult::new(vec![column.to_string()], vec![vec![value]])
    }

    #[test]
    fn test_average_salary_is_currency() {
        let out = ResultFormatter::default().format(
            &scalar("AVG(MonthlyIncome)", CellValue::Real(6500.0)),
            "What's the average salary?",
        );
        assert_eq!(out, "**Average salary:** $6,500.00");
    }

    #[test]
    fn test_average_age_in_years() {
        let out = ResultFormatter::default().format(
            &scalar("AVG(Age)", CellValue::Real(36.923809)),
            "What is the average age of employees?",
        );
        assert_eq!(out, "**Average age:** 36.92 years");
    }

    #[test]
    fn test_rate_column_is_percent() {
        let out = ResultFormatter::default().format(
            &scalar("attrition_rate", CellValue::Real(23.4)),
            "What's the attrition rate for overtime workers?",
        );
        assert_eq!(out, "**Rate:** 23.40%");
    }

    #[test]
    fn test_small_real_is_percent() {
        let out = ResultFormatter::default().format(&scalar("value", CellValue::Real(16.1224)), "attrition?");
        assert_eq!(out, "**Result:** 16.12%");
    }

    #[test]
    fn test_salary_column_total_is_currency() {
        let out = ResultFormatter::default().format(&scalar("MAX(MonthlyIncome)", CellValue::Integer(19999)), "top earner");
        assert_eq!(out, "**Result:** $19,999.00");
    }

    #[test]
    fn test_counts_are_grouped() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&scalar("COUNT(*)", CellValue::Integer(1470)), "How many employees?"),
            "**Count:** 1,470"
        );
        assert_eq!(
            formatter.format(&scalar("total", CellValue::Integer(1234567)), "total?"),
            "**Result:** 1,234,567"
        );
    }

    #[test]
    fn test_other_real_two_decimals() {
        let out = ResultFormatter::default().format(
            &scalar("AVG(YearsAtCompany)", CellValue::Real(7.008163)),
            "average tenure",
        );
        assert_eq!(out, "**Result:** 7.01");
    }

    #[test]
    fn test_age_column_wins_over_salary_wording() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(
                &scalar("AVG(Age)", CellValue::Real(36.92)),
                "What's the average age of employees whose salary is above 5000?"
            ),
            "**Average age:** 36.92 years"
        );
        assert_eq!(
            formatter.format(&scalar("AVG(Age)", CellValue::Real(36.92)), "Average age of people on the payroll?"),
            "**Average age:** 36.92 years"
        );
    }

    #[test]
    fn test_percent_salary_hike_is_a_rate() {
        let out = ResultFormatter::default().format(
            &scalar("AVG(PercentSalaryHike)", CellValue::Real(15.2095)),
            "What's the average salary hike?",
        );
        assert_eq!(out, "**Rate:** 15.21%");
    }

    #[test]
    fn test_neutral_column_uses_question_wording() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&scalar("value", CellValue::Real(6502.93)), "average salary in Sales?"),
            "**Average salary:** $6,502.93"
        );
        assert_eq!(
            formatter.format(&scalar("value", CellValue::Real(36.9)), "average age of the payroll"),
            "**Average age:** 36.90 years"
        );
    }

    #[test]
    fn test_percent_exceptions() {
        let formatter = ResultFormatter::default();
        // Averages of small reals stay plain numbers.
        assert_eq!(
            formatter.format(&scalar("AVG(JobSatisfaction)", CellValue::Real(2.7287)), "average satisfaction"),
            "**Result:** 2.73"
        );
        assert_eq!(formatter.format(&scalar("delta", CellValue::Real(-3.5)), "change?"), "**Result:** -3.50");
        // Rate-named columns above 100 are amounts, not percentages.
        assert_eq!(
            formatter.format(&scalar("AVG(MonthlyRate)", CellValue::Real(14313.1)), "average monthly rate"),
            "**Result:** 14,313.10"
        );
    }

    #[test]
    fn test_words_split_camel_case() {
        assert_eq!(words("AVG(MonthlyIncome)"), vec!["avg", "monthly", "income"]);
        assert_eq!(words("attrition_rate"), vec!["attrition", "rate"]);
        assert_eq!(words("payroll"), vec!["payroll"]);
    }

    #[test]
    fn test_non_numeric_scalar() {
        let formatter = ResultFormatter::default();
        assert_eq!(
            formatter.format(&scalar("Department", CellValue::Text("Sales".into())), "which?"),
            "Result: Sales"
        );
        assert_eq!(formatter.format(&scalar("x", CellValue::Null), "q"), "Result: NULL");
    }

    #[test]
    fn test_five_row_table() {
        let rows = (1..=5)
            .map(|i| vec![CellValue::Text(format!("Role{}", i)), CellValue::Integer(i * 10)])
            .collect();
        let result = QueryResult::new(vec!["JobRole".into(), "n".into()], rows);
        let out = ResultFormatter::default().format(&result, "by role");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "**Results (5 rows):**");
        assert_eq!(lines[2], "| JobRole | n |");
        assert_eq!(lines[3], "|---|---|");
        assert_eq!(lines[4], "| Role1 | 10 |");
        assert_eq!(lines.len(), 9);
        assert!(!out.contains("omitted"));
    }

    #[test]
    fn test_table_is_capped() {
        let rows = (0..30).map(|i| vec![CellValue::Integer(i)]).collect();
        let result = QueryResult::new(vec!["EmployeeNumber".into()], rows);
        let out = ResultFormatter::default().format(&result, "list");

        assert!(out.starts_with("**Results (30 rows):**"));
        assert!(out.contains("| 24 |"));
        assert!(!out.contains("| 25 |"));
        assert!(out.ends_with("_Showing first 25 of 30 rows (5 omitted)._"));
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::new(vec!["a".into()], vec![]);
        assert_eq!(ResultFormatter::default().format(&result, "q"), "No rows returned.");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("-1234567.50"), "-1,234,567.50");
    }
}
