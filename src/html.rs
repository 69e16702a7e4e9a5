//! Low-level HTML string extraction helpers.
//!
//! Deliberately naive, tailored to the handful of markup shapes the brand
//! sites use: a `<select>` of org ids, plain `<table>` listings, and store
//! cards with a heading, a paragraph and a link. Tag and attribute matching
//! is ASCII case-insensitive; cell text keeps its Cyrillic content as-is.

/// Inner HTML between an opening-tag prefix (attributes allowed after it)
/// and the matching closing tag, case-insensitive on the ASCII tag text.
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = lowercase_ascii(s);
    let open_idx = lc.find(&lowercase_ascii(open_pat))?;
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_rel = lc[after_open..].find(&lowercase_ascii(close_pat))?;
    Some(&s[after_open..after_open + close_rel])
}

/// Next complete `<open ...>...</close>` block from `from` onwards.
/// Returns (start of opening tag, end just past the closing tag).
pub fn next_tag_block_ci(
    s: &str,
    open_tag: &str,
    close_tag: &str,
    from: usize,
) -> Option<(usize, usize)> {
    let lc = lowercase_ascii(s);
    let start = lc.get(from..)?.find(&lowercase_ascii(open_tag))? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&lowercase_ascii(close_tag))?;
    Some((start, open_end + end_rel + close_tag.len()))
}

/// Text content of a complete tag block, tags stripped, whitespace collapsed.
pub fn block_text(block: &str) -> String {
    let open_end = match block.find('>') {
        Some(i) => i + 1,
        None => 0,
    };
    let close_start = block.rfind('<').filter(|&i| i > open_end).unwrap_or(block.len());
    strip_tags(&block[open_end..close_start])
}

/// Value of an attribute inside an opening tag, handling `'`, `"` and bare
/// forms. `tag` is the slice from `<` up to (at least) the closing `>`.
pub fn attr_value(tag: &str, name: &str) -> Option<String> {
    let lc = lowercase_ascii(tag);
    let pat = format!("{}=", lowercase_ascii(name));
    let mut search_from = 0;
    loop {
        let idx = lc[search_from..].find(&pat)? + search_from;
        // Must be preceded by whitespace so "data-href=" never matches "href=".
        let ok = idx == 0 || lc.as_bytes()[idx - 1].is_ascii_whitespace();
        if !ok {
            search_from = idx + pat.len();
            continue;
        }
        let rest = &tag[idx + pat.len()..];
        let mut chars = rest.chars();
        return match chars.next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rest[1..];
                body.find(q).map(|end| body[..end].to_string())
            }
            Some(_) => Some(
                rest.split(|c: char| c.is_ascii_whitespace() || c == '>')
                    .next()
                    .unwrap_or("")
                    .to_string(),
            ),
            None => None,
        };
    }
}

/// All `(value, label)` pairs from `<select name="...">`; options with an
/// empty `value` (placeholder entries) are dropped. `None` when there is no
/// such select element at all; callers treat that as markup drift.
pub fn select_options(html: &str, select_name: &str) -> Option<Vec<(String, String)>> {
    let select = find_select(html, select_name)?;
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = next_tag_block_ci(select, "<option", "</option>", pos) {
        let block = &select[start..end];
        let open = &block[..block.find('>').map(|i| i + 1).unwrap_or(block.len())];
        if let Some(value) = attr_value(open, "value") {
            if !value.is_empty() {
                out.push((value, block_text(block)));
            }
        }
        pos = end;
    }
    Some(out)
}

fn find_select<'a>(html: &'a str, select_name: &str) -> Option<&'a str> {
    let lc = lowercase_ascii(html);
    let mut pos = 0;
    while let Some(rel) = lc[pos..].find("<select") {
        let start = pos + rel;
        let open_end = html[start..].find('>')? + start;
        let open_tag = &html[start..=open_end];
        if attr_value(open_tag, "name").as_deref() == Some(select_name) {
            let close_rel = lc[open_end..].find("</select>")?;
            return Some(&html[open_end + 1..open_end + close_rel]);
        }
        pos = open_end + 1;
    }
    None
}

/// Cell texts of every `<tr>` inside the first table section matched by
/// `open_pat` (e.g. `"<tbody"` or `"<table"`). Rows with no `<td>` cells
/// (header rows of `<th>`) come back as empty vectors.
pub fn table_rows(html: &str, open_pat: &str, close_pat: &str) -> Option<Vec<Vec<String>>> {
    let section = slice_between_ci(html, open_pat, close_pat)?;
    let mut rows = Vec::new();
    let mut pos = 0;
    while let Some((tr_start, tr_end)) = next_tag_block_ci(section, "<tr", "</tr>", pos) {
        let row_html = &section[tr_start..tr_end];
        let mut cells = Vec::new();
        let mut cell_pos = 0;
        while let Some((td_start, td_end)) = next_tag_block_ci(row_html, "<td", "</td>", cell_pos) {
            cells.push(block_text(&row_html[td_start..td_end]));
            cell_pos = td_end;
        }
        rows.push(cells);
        pos = tr_end;
    }
    Some(rows)
}

/// Every complete `<tag>` block whose opening tag carries the given CSS
/// class. Used for the KAM store cards.
pub fn blocks_with_class<'a>(html: &'a str, tag: &str, class: &str) -> Vec<&'a str> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = next_tag_block_ci(html, &open, &close, pos) {
        let block = &html[start..end];
        let open_tag = &block[..block.find('>').map(|i| i + 1).unwrap_or(block.len())];
        let has_class = attr_value(open_tag, "class")
            .map(|c| c.split_ascii_whitespace().any(|w| w == class))
            .unwrap_or(false);
        if has_class {
            out.push(block);
        }
        pos = end;
    }
    out
}

/// All `href` values of anchor tags in document order.
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;
    let lc = lowercase_ascii(html);
    while let Some(rel) = lc[pos..].find("<a") {
        let start = pos + rel;
        // Require a delimiter so "<abbr" etc. never match.
        let next = lc.as_bytes().get(start + 2).copied().unwrap_or(b'>');
        if !next.is_ascii_whitespace() && next != b'>' {
            pos = start + 2;
            continue;
        }
        let open_end = match html[start..].find('>') {
            Some(i) => i + start,
            None => break,
        };
        if let Some(href) = attr_value(&html[start..=open_end], "href") {
            out.push(href);
        }
        pos = open_end + 1;
    }
    out
}

/// First anchor block `(href, text)` inside the given HTML fragment.
pub fn first_anchor(html: &str) -> Option<(String, String)> {
    let (start, end) = next_tag_block_ci(html, "<a", "</a>", 0)?;
    let block = &html[start..end];
    let open_tag = &block[..block.find('>').map(|i| i + 1).unwrap_or(block.len())];
    Some((attr_value(open_tag, "href")?, block_text(block)))
}

/// Remove all `<...>` tags, decode the common entities, collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

/// Minimal entity decoding: the few the brand sites actually emit.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Collapse whitespace runs to a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// ASCII-only lowercasing: tag names are ASCII, content may be Cyrillic.
fn lowercase_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
