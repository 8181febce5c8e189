pub fn parse_header(value: &str) -> Result<(String, String), String> {
    let raw = value.trim();
    let (key, val) = raw
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((key.to_string(), val.trim().to_string()))
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

pub fn parse_assignment(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| "expected format INPUT=VALUE".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("input name is empty".to_string());
    }
    Ok((key.to_string(), val.trim().to_string()))
}

pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}
