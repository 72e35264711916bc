//! URL utilities for resolving product links against a site base URL.

use url::Url;

pub fn convert_to_absolute_url(link: &str, base_url: &str) -> Result<String, String> {
    let base = Url::parse(base_url).map_err(|e| e.to_string())?;
    let absolute_url = base.join(link).map_err(|e| e.to_string())?;
    Ok(absolute_url.to_string())
}

/// Resolve a product link from card markup.
///
/// Root-relative paths are appended to the base as-is so that Cyrillic slugs
/// keep their on-page spelling; other relative forms go through a full URL
/// join. An empty link stays empty.
pub fn resolve_link(href: &str, base_url: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    if href.starts_with('/') {
        return format!("{}{}", base_url.trim_end_matches('/'), href);
    }
    convert_to_absolute_url(href, base_url).unwrap_or_else(|_| href.to_string())
}

/// Add https:// prefix for bare domains (CLI convenience).
pub fn normalize_url_for_cli(url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    format!("https://{}", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_absolute_url() {
        assert_eq!(
            convert_to_absolute_url("page1", "https://maudau.com.ua/category/").unwrap(),
            "https://maudau.com.ua/category/page1"
        );
        assert!(convert_to_absolute_url("x", "not a url").is_err());
    }

    #[test]
    fn test_resolve_root_relative_link() {
        assert_eq!(
            resolve_link("/product/gel-dlia-prannia", "https://maudau.com.ua"),
            "https://maudau.com.ua/product/gel-dlia-prannia"
        );
        assert_eq!(
            resolve_link("/ua/shop/mylo.html", "https://epicentrk.ua/"),
            "https://epicentrk.ua/ua/shop/mylo.html"
        );
    }

    #[test]
    fn test_resolve_keeps_absolute_and_empty() {
        assert_eq!(
            resolve_link("https://rozetka.com.ua/ua/p123/", "https://rozetka.com.ua"),
            "https://rozetka.com.ua/ua/p123/"
        );
        assert_eq!(resolve_link("  ", "https://rozetka.com.ua"), "");
    }

    #[test]
    fn test_resolve_protocol_relative_and_bare_relative() {
        assert_eq!(
            resolve_link("//cdn.example.ua/a.jpg", "https://maudau.com.ua"),
            "https://cdn.example.ua/a.jpg"
        );
        assert_eq!(
            resolve_link("p123/", "https://rozetka.com.ua/ua/"),
            "https://rozetka.com.ua/ua/p123/"
        );
    }

    #[test]
    fn test_normalize_url_for_cli() {
        assert_eq!(
            normalize_url_for_cli("maudau.com.ua/category/zasoby-dlia-prannia/"),
            "https://maudau.com.ua/category/zasoby-dlia-prannia/"
        );
        assert_eq!(
            normalize_url_for_cli(" https://rozetka.com.ua/ "),
            "https://rozetka.com.ua/"
        );
    }
}
