//! Item info rendering
//!
//! Renders the configurable output template for an item's detail view and
//! derives the calendar link from the item's release date. Both
//! configuration values are free text owned by the settings surface; the
//! engine only reads them.

/// Compiled default output template
pub const DEFAULT_TEMPLATE: &str =
    "{{aitem [[asin]],[[title]],[[author]],[[date]],[[image_url]]}}";

/// Compiled default calendar-link base URL
pub const DEFAULT_DATE_LINK_URL: &str =
    "https://www.vkdb.jp/wiki.cgi?action=EDIT&page=%A5%AB%A5%EC%A5%F3%A5%C0%A1%BC/";

/// Item fields available to the output template
#[derive(Debug, Clone, Default)]
pub struct ItemInfo {
    pub asin: String,
    pub title: String,
    pub author: String,
    /// Release date, `YYYY/M/D` or `YYYY-M-D` somewhere in the text
    pub date: String,
    pub image_url: String,
}

impl ItemInfo {
    /// Sanitize every field for single-line template output
    pub fn sanitized(self) -> Self {
        Self {
            asin: sanitize_field(&self.asin),
            title: sanitize_field(&self.title),
            author: sanitize_field(&self.author),
            date: sanitize_field(&self.date),
            image_url: sanitize_field(&self.image_url),
        }
    }
}

/// Fold line breaks to single spaces and trim, so a field cannot break
/// the rendered line
pub fn sanitize_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_break = false;
    for c in value.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out.trim().to_string()
}

/// Substitute the `[[...]]` placeholders of `template` with item fields
pub fn render_template(template: &str, info: &ItemInfo) -> String {
    template
        .replace("[[asin]]", &info.asin)
        .replace("[[title]]", &info.title)
        .replace("[[author]]", &info.author)
        .replace("[[date]]", &info.date)
        .replace("[[image_url]]", &info.image_url)
}

/// Build the calendar edit link for a release date.
///
/// The date is folded to `YYYY-M-D` without zero padding and appended to
/// the configured base URL; None when no date is recognizable.
pub fn date_link(base_url: &str, date: &str) -> Option<String> {
    let (year, month, day) = parse_date(date)?;
    Some(format!("{base_url}{year}-{month}-{day}"))
}

/// Extract the first `YYYY/M/D` or `YYYY-M-D` date embedded in free text
fn parse_date(text: &str) -> Option<(u32, u32, u32)> {
    let chars: Vec<char> = text.chars().collect();
    (0..chars.len()).find_map(|start| parse_date_at(&chars[start..]))
}

fn parse_date_at(chars: &[char]) -> Option<(u32, u32, u32)> {
    // exactly four year digits followed by a separator
    if chars.len() < 5 || !chars[..4].iter().all(|c| c.is_ascii_digit()) || !is_sep(chars[4]) {
        return None;
    }
    let year = number(&chars[..4]);

    // month: one or two digits followed by a separator (longest first)
    for month_len in [2usize, 1] {
        let sep_idx = 4 + 1 + month_len;
        if chars.len() <= sep_idx
            || !chars[5..5 + month_len].iter().all(|c| c.is_ascii_digit())
            || !is_sep(chars[sep_idx])
        {
            continue;
        }
        let month = number(&chars[5..5 + month_len]);

        // day: one or two digits, whatever follows
        let day_start = sep_idx + 1;
        let mut day_len = 0;
        while day_len < 2
            && day_start + day_len < chars.len()
            && chars[day_start + day_len].is_ascii_digit()
        {
            day_len += 1;
        }
        if day_len == 0 {
            continue;
        }
        let day = number(&chars[day_start..day_start + day_len]);
        return Some((year, month, day));
    }
    None
}

fn is_sep(c: char) -> bool {
    c == '/' || c == '-'
}

fn number(digits: &[char]) -> u32 {
    digits.iter().fold(0, |acc, c| {
        acc * 10 + c.to_digit(10).unwrap_or(0)
    })
}
