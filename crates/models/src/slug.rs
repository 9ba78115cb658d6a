/// Turns a restaurant name into the URL slug used in customer links.
///
/// Lower-cases the name, turns runs of whitespace into `-`, drops anything
/// that is not an ASCII word character or `-`, then collapses repeated
/// dashes and trims them from both ends.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('-').to_string()
}
