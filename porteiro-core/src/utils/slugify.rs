use deunicode::deunicode_char;

/// Lowercase ascii slug; runs of non-alphanumeric characters collapse to a
/// single dash, leading/trailing dashes are stripped.
pub fn slugify<S: AsRef<str>>(s: S) -> String {
    let mut slug = String::with_capacity(s.as_ref().len());
    let mut pending_dash = false;

    let mut push_byte = |slug: &mut String, pending_dash: &mut bool, b: u8| match b {
        b'a'..=b'z' | b'0'..=b'9' => {
            if *pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            *pending_dash = false;
            slug.push(b.into());
        }
        b'A'..=b'Z' => {
            if *pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            *pending_dash = false;
            slug.push((b - b'A' + b'a').into());
        }
        _ => *pending_dash = true,
    };

    for c in s.as_ref().chars() {
        if c.is_ascii() {
            push_byte(&mut slug, &mut pending_dash, c as u8);
        } else {
            for &b in deunicode_char(c).unwrap_or("-").as_bytes() {
                push_byte(&mut slug, &mut pending_dash, b);
            }
        }
    }

    slug.shrink_to_fit();
    slug
}
