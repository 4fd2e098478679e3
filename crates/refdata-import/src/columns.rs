//! 컬럼명 정규화.
//!
//! 대소문자, 구분자, 언어 변형 등 다양한 헤더 철자를 하나의 표준
//! 필드명으로 매핑합니다. 순수 함수이며 실패하지 않습니다 — 매핑이
//! 없는 헤더는 소문자로 변환되어 그대로 통과하므로 예상치 못한 컬럼도
//! 조용히 버려지지 않고 보존됩니다.

/// 가격 파일(주가) 컬럼 정규화.
pub fn normalize_price_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase();

    match normalized.as_str() {
        "date" => "date",
        "open" => "open",
        "high" => "high",
        "low" => "low",
        "close" => "close",
        "volume" => "volume",
        "trendq" | "trend_q" => "trend_q",
        "fq" | "f_q" => "fq",
        "banddown" | "band_down" => "band_down",
        "bandup" | "band_up" => "band_up",
        "symbol" | "ticker" => "symbol",
        _ => return normalized,
    }
    .to_string()
}

/// 환율 파일 컬럼 정규화.
///
/// 가격 필드는 주가 파일과 같지만 식별자 컬럼이 통화 코드입니다.
pub fn normalize_currency_price_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase();

    match normalized.as_str() {
        "date" => "date",
        "open" => "open",
        "high" => "high",
        "low" => "low",
        "close" => "close",
        "trendq" | "trend_q" => "trend_q",
        "fq" | "f_q" => "fq",
        "currencycode" | "currency_code" | "currency" | "code" => "currency_code",
        _ => return normalized,
    }
    .to_string()
}

/// 통화 목록 파일 컬럼 정규화.
pub fn normalize_currency_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase();

    match normalized.as_str() {
        "code" | "currency_code" | "currencycode" | "currency" => "code",
        "name" | "currency_name" | "currencyname" | "description" => "name",
        _ => return normalized,
    }
    .to_string()
}

/// 종목 프로필 파일 컬럼 정규화.
pub fn normalize_profile_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase();

    match normalized.as_str() {
        "symbol" | "ticker" => "symbol",
        "price" => "price",
        "profit" => "profit",
        "volume" => "volume",
        "pe" | "p_e" => "pe",
        "eps" => "eps",
        "roa" => "roa",
        "roe" => "roe",
        _ => return normalized,
    }
    .to_string()
}

/// 재무지표 파일 컬럼 정규화.
pub fn normalize_metric_column(name: &str) -> String {
    let normalized = name.trim().to_lowercase();

    match normalized.as_str() {
        "symbol" | "ticker" => "symbol",
        "year" => "year",
        "quarter" => "quarter",
        "eps" => "eps",
        "epsindustry" | "eps_industry" => "eps_industry",
        "pe" | "p_e" => "pe",
        "peindustry" | "pe_industry" => "pe_industry",
        "roa" => "roa",
        "roe" => "roe",
        "roaindustry" | "roa_industry" => "roa_industry",
        "roeindustry" | "roe_industry" => "roe_industry",
        "revenue" => "revenue",
        "margin" => "margin",
        "totaldebttoequity" | "total_debt_to_equity" | "debt_to_equity" => "total_debt_to_equity",
        "totalassetstoequity" | "total_assets_to_equity" | "assets_to_equity" => {
            "total_assets_to_equity"
        }
        _ => return normalized,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_column_variants() {
        assert_eq!(normalize_price_column("Date"), "date");
        assert_eq!(normalize_price_column(" CLOSE "), "close");
        assert_eq!(normalize_price_column("TrendQ"), "trend_q");
        assert_eq!(normalize_price_column("trend_q"), "trend_q");
        assert_eq!(normalize_price_column("BandUp"), "band_up");
        assert_eq!(normalize_price_column("Ticker"), "symbol");
    }

    #[test]
    fn test_currency_code_variants() {
        for variant in ["currencyCode", "currency_code", "Currency", "CODE"] {
            assert_eq!(
                normalize_currency_price_column(variant),
                "currency_code",
                "variant: {}",
                variant
            );
        }
    }

    #[test]
    fn test_unknown_column_passes_through_lowercased() {
        assert_eq!(normalize_price_column("Adj Close"), "adj close");
        assert_eq!(normalize_metric_column("EBITDA"), "ebitda");
    }

    #[test]
    fn test_profile_columns() {
        assert_eq!(normalize_profile_column("Ticker"), "symbol");
        assert_eq!(normalize_profile_column(" ROE "), "roe");
        assert_eq!(normalize_profile_column("Price"), "price");
    }

    #[test]
    fn test_currency_list_columns() {
        assert_eq!(normalize_currency_column("Description"), "name");
        assert_eq!(normalize_currency_column("currency"), "code");
    }
}
