//! Slug Generation
//!
//! Category slugs are derived from the display name: lowercase,
//! accents folded to ASCII, anything else collapsed to single hyphens.

/// Generate a URL slug from a display name.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true; // suppress leading hyphen

    for c in name.to_lowercase().chars() {
        let folded = fold_accent(c);
        if folded.is_ascii_alphanumeric() {
            slug.push(folded);
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('-');
            last_was_sep = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Fold common Latin accented characters to their ASCII base letter.
fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(generate_slug("Books"), "books");
        assert_eq!(generate_slug("Home & Garden"), "home-garden");
    }

    #[test]
    fn test_accent_folding() {
        assert_eq!(generate_slug("Eletrônicos"), "eletronicos");
        assert_eq!(generate_slug("Casa e Decoração"), "casa-e-decoracao");
    }

    #[test]
    fn test_collapses_separators() {
        assert_eq!(generate_slug("  a -- b  "), "a-b");
        assert_eq!(generate_slug("---"), "");
    }

    #[test]
    fn test_trims_hyphens() {
        assert_eq!(generate_slug("!Sports!"), "sports");
    }
}
