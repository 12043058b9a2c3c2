use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tera::Error as TeraError;

use crate::models::search::SearchResult;
use crate::prompt_template::{load_prompt, WEB_SEARCH_TEMPLATE};

/// Appended to the question when network mode found nothing to ground on
pub const NO_RESULTS_NOTE: &str = "[搜索未找到相关结果]";

#[derive(Serialize)]
struct WebSearchContext<'a> {
    results: &'a [SearchResult],
    today: String,
    input: &'a str,
}

/// Wrap `input` with numbered `[webpage N begin]...[webpage N end]` blocks and
/// answering instructions. The question is kept verbatim.
pub fn assemble_prompt(
    input: &str,
    results: &[SearchResult],
    today: NaiveDate,
) -> Result<String, TeraError> {
    let context = WebSearchContext {
        results,
        today: format_date_zh(today),
        input,
    };
    load_prompt(WEB_SEARCH_TEMPLATE, &context)
}

pub fn degraded_prompt(input: &str) -> String {
    format!("{}\n\n{}", input, NO_RESULTS_NOTE)
}

/// `2026年10月16日 星期五`
pub fn format_date_zh(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "一",
        Weekday::Tue => "二",
        Weekday::Wed => "三",
        Weekday::Thu => "四",
        Weekday::Fri => "五",
        Weekday::Sat => "六",
        Weekday::Sun => "日",
    };
    format!(
        "{}年{}月{}日 星期{}",
        date.year(),
        date.month(),
        date.day(),
        weekday
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn results() -> Vec<SearchResult> {
        vec![
            SearchResult::new("北京天气预报", "https://weather.example/bj", "晴，最高气温 18 度"),
            SearchResult::new("Beijing", "https://en.example/bj", "Capital of China"),
        ]
    }

    #[test]
    fn test_format_date_zh() {
        assert_eq!(format_date_zh(day()), "2026年10月16日 星期五");
        assert_eq!(
            format_date_zh(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()),
            "2024年1月7日 星期日"
        );
    }

    #[test]
    fn test_blocks_are_numbered_in_order() {
        let prompt = assemble_prompt("今天北京天气", &results(), day()).unwrap();

        let first = prompt.find("[webpage 1 begin]").unwrap();
        let first_end = prompt.find("[webpage 1 end]").unwrap();
        let second = prompt.find("[webpage 2 begin]").unwrap();
        assert!(first < first_end && first_end < second);
        assert!(prompt.contains("Title: 北京天气预报\nUrl: https://weather.example/bj\nSnippet: 晴，最高气温 18 度"));
        assert!(prompt.contains("[webpage 2 end]"));
        assert!(!prompt.contains("[webpage 3 begin]"));
        assert!(prompt.contains("**当前时间：** 2026年10月16日 星期五"));
    }

    #[test]
    fn test_question_is_kept_verbatim_and_last() {
        let inputs = [
            "今天北京天气",
            "what does {{ x }} mean in <html> & jinja?",
            "{% raw %} unbalanced",
            "multi\nline\n  question",
        ];
        for input in inputs {
            let prompt = assemble_prompt(input, &results(), day()).unwrap();
            let question_at = prompt.rfind(input).unwrap();
            let instructions_at = prompt.find("**用户问题：**").unwrap();
            assert!(question_at > instructions_at);
            assert!(prompt.trim_end().ends_with("提供准确、有用且结构清晰的回答。**"));
        }
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let a = assemble_prompt("q", &results(), day()).unwrap();
        let b = assemble_prompt("q", &results(), day()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degraded_prompt_keeps_input() {
        assert_eq!(degraded_prompt("你好"), "你好\n\n[搜索未找到相关结果]");
    }
}
