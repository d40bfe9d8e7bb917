use crate::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static FORM_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<form[^>]*?(?:id="challenge-form"[^>]*?action="([^"]+)"|action="([^"]+)"[^>]*?id="challenge-form")"#)
        .expect("Invalid form action regex")
});
static JSCHL_VC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="jschl_vc"\s+value="([^"]+)""#).expect("Invalid jschl_vc regex")
});
static PASS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="pass"\s+value="([^"]+)""#).expect("Invalid pass regex")
});
static INIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z]\w*)\s*=\s*\{\s*"?([A-Za-z]\w*)"?\s*:\s*([^}]+?)\s*\}\s*;"#)
        .expect("Invalid init regex")
});
static DELAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\}\s*,\s*(\d{3,6})\s*\)").expect("Invalid delay regex")
});
static CAPTCHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(g-recaptcha|h-captcha|cf-turnstile|cf_chl_captcha)")
        .expect("Invalid captcha regex")
});

/// Markers that identify a bot-challenge interstitial
pub fn is_challenge_page(status: u16, body: &str) -> bool {
    if status != 503 && status != 403 {
        return false;
    }
    body.contains("jschl_vc")
        || body.contains("cf-browser-verification")
        || body.contains("Just a moment")
        || body.contains("cf_chl_")
        || body.contains("DDoS-Guard")
}

/// A solved challenge, ready for submission
#[derive(Debug)]
pub struct Challenge {
    /// Absolute URL of the challenge form endpoint
    pub submit_url: String,
    /// Query parameters including the computed answer
    pub params: Vec<(String, String)>,
    /// Wait the page mandates before submitting
    pub delay: Duration,
}

/// Solve the legacy arithmetic interstitial.
///
/// Extracts the hidden form fields and the obfuscated expression, evaluates
/// it, and adds the hostname length. Interactive CAPTCHA pages and anything
/// that does not carry the arithmetic form fail typed; the caller skips the
/// site.
pub fn solve_challenge(page_url: &reqwest::Url, body: &str) -> Result<Challenge> {
    if CAPTCHA.is_match(body) {
        return Err(Error::Challenge(
            "interactive captcha, cannot solve".to_string(),
        ));
    }

    let host = page_url
        .host_str()
        .ok_or_else(|| Error::Challenge("challenge URL has no host".to_string()))?;

    let jschl_vc = capture(&JSCHL_VC, body, "jschl_vc")?;
    let pass = capture(&PASS_FIELD, body, "pass")?;

    let action = FORM_ACTION
        .captures(body)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "/cdn-cgi/l/chk_jschl".to_string());

    let submit_url = page_url
        .join(&action)
        .map_err(|e| Error::Challenge(format!("bad form action {action}: {e}")))?
        .to_string();

    let answer = compute_answer(body, host)?;

    let delay_ms = DELAY
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(4000)
        .min(8000);

    Ok(Challenge {
        submit_url,
        params: vec![
            ("jschl_vc".to_string(), jschl_vc),
            ("pass".to_string(), pass),
            ("jschl_answer".to_string(), answer),
        ],
        delay: Duration::from_millis(delay_ms),
    })
}

fn capture(re: &Regex, body: &str, what: &str) -> Result<String> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Challenge(format!("no {what} field in challenge page")))
}

/// Evaluate the seed assignment and the follow-up mutations, then add the
/// hostname length as the page's script does.
fn compute_answer(body: &str, host: &str) -> Result<String> {
    let caps = INIT
        .captures(body)
        .ok_or_else(|| Error::Challenge("no seed expression".to_string()))?;

    let obj = caps.get(1).map_or("", |m| m.as_str());
    let key = caps.get(2).map_or("", |m| m.as_str());
    let mut value = eval_expression(caps.get(3).map_or("", |m| m.as_str()))?;

    let ops = Regex::new(&format!(
        r"{}\.{}\s*([+\-*/])=\s*([^;]+);",
        regex::escape(obj),
        regex::escape(key)
    ))
    .map_err(|e| Error::Challenge(format!("bad ops regex: {e}")))?;

    for op in ops.captures_iter(body) {
        let operand = eval_expression(op.get(2).map_or("", |m| m.as_str()))?;
        match op.get(1).map_or("", |m| m.as_str()) {
            "+" => value += operand,
            "-" => value -= operand,
            "*" => value *= operand,
            "/" => {
                if operand == 0.0 {
                    return Err(Error::Challenge("division by zero".to_string()));
                }
                value /= operand;
            }
            _ => unreachable!(),
        }
    }

    // a.value = +p.toFixed(10) + t.length
    let answer = round10(value) + host.len() as f64;
    Ok(format_number(answer))
}

/// Evaluate one obfuscated numeric expression.
///
/// The page encodes digits as sums of coerced booleans: `!+[]` and `!![]`
/// are 1, `+[]` is 0, and a trailing `+[]` turns a group into a string so
/// adjacent groups concatenate into multi-digit numbers. A top-level `/`
/// divides two such numbers.
fn eval_expression(expr: &str) -> Result<f64> {
    let expr = expr.trim();

    if let Some(pos) = top_level_divide(expr) {
        let num = eval_expression(&expr[..pos])?;
        let den = eval_expression(&expr[pos + 1..])?;
        if den == 0.0 {
            return Err(Error::Challenge("division by zero".to_string()));
        }
        return Ok(num / den);
    }

    let inner = strip_outer_parens(expr.trim_start_matches('+').trim());
    let groups = depth1_groups(inner);

    if groups.is_empty() {
        return Ok(count_ones(inner) as f64);
    }

    let mut stringified = false;
    let mut parts = Vec::with_capacity(groups.len());
    for group in &groups {
        let (value, as_string) = eval_group(group);
        stringified |= as_string;
        parts.push(value);
    }

    if stringified {
        let digits: String = parts.iter().map(u64::to_string).collect();
        digits
            .parse()
            .map_err(|e| Error::Challenge(format!("bad digit string {digits}: {e}")))
    } else {
        Ok(parts.iter().sum::<u64>() as f64)
    }
}

fn eval_group(group: &str) -> (u64, bool) {
    let group = group.trim();
    let stringified = group.ends_with("+[]") && !group.ends_with("!+[]");
    let body = if stringified {
        &group[..group.len() - 3]
    } else {
        group
    };
    (count_ones(body), stringified)
}

fn count_ones(s: &str) -> u64 {
    (s.matches("!![]").count() + s.matches("!+[]").count()) as u64
}

fn top_level_divide(expr: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '/' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn strip_outer_parens(expr: &str) -> &str {
    let expr = expr.trim();
    if !expr.starts_with('(') || !expr.ends_with(')') {
        return expr;
    }
    // Only strip when the opening paren closes at the very end
    let mut depth = 0i32;
    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return if i == expr.len() - 1 {
                        &expr[1..expr.len() - 1]
                    } else {
                        expr
                    };
                }
            }
            _ => {}
        }
    }
    expr
}

fn depth1_groups(s: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;

    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    groups.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
            _ => {
                if depth > 0 {
                    current.push(c);
                }
            }
        }
    }

    groups
}

fn round10(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.10}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
