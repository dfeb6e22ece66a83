//! Form bodies: `application/x-www-form-urlencoded` and `multipart/form-data`.

/// Decoded form fields in body order.
///
/// # Examples
///
/// ```
/// use homestation_api::FormData;
///
/// let form = FormData::parse(b"state=on&note=hello+world%21");
/// assert_eq!(form.get("state"), Some("on"));
/// assert_eq!(form.get("note"), Some("hello world!"));
/// assert_eq!(form.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Parse a urlencoded body. Malformed escapes are kept literally.
    pub fn parse(body: &[u8]) -> Self {
        let fields = body
            .split(|&b| b == b'&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = match pair.iter().position(|&b| b == b'=') {
                    Some(i) => (&pair[..i], &pair[i + 1..]),
                    None => (pair, &pair[pair.len()..]),
                };
                (percent_decode(name), percent_decode(value))
            })
            .collect();
        Self { fields }
    }

    /// Parse a `multipart/form-data` body delimited by `boundary`.
    ///
    /// File parts are skipped. Parsing stops at the closing delimiter or at
    /// the first part that is not terminated.
    ///
    /// ```
    /// use homestation_api::FormData;
    ///
    /// let body = b"--XX\r\nContent-Disposition: form-data; name=\"state\"\r\n\r\non\r\n--XX--\r\n";
    /// let form = FormData::parse_multipart(body, "XX");
    /// assert_eq!(form.get("state"), Some("on"));
    /// ```
    pub fn parse_multipart(body: &[u8], boundary: &str) -> Self {
        let delimiter = format!("--{boundary}");
        let delimiter = delimiter.as_bytes();

        let Some(start) = find(body, delimiter) else {
            return Self::default();
        };
        let mut rest = &body[start + delimiter.len()..];
        let mut fields = Vec::new();

        while !rest.starts_with(b"--") {
            let Some(end) = find(rest, delimiter) else {
                break;
            };
            if let Some(field) = multipart_field(&rest[..end]) {
                fields.push(field);
            }
            rest = &rest[end + delimiter.len()..];
        }

        Self { fields }
    }

    /// First value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Boundary parameter of a `multipart/form-data` content type.
pub(crate) fn multipart_boundary(content_type: &str) -> Option<&str> {
    let (media, params) = content_type.split_once(';')?;
    if !media.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .split(';')
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"'))
        })
        .filter(|boundary| !boundary.is_empty())
}

/// Name and value of one multipart part, `None` for file uploads.
fn multipart_field(part: &[u8]) -> Option<(String, String)> {
    let part = part.strip_prefix(b"\r\n").unwrap_or(part);
    let split = find(part, b"\r\n\r\n")?;
    let head = String::from_utf8_lossy(&part[..split]);
    let value = &part[split + 4..];
    let value = value.strip_suffix(b"\r\n").unwrap_or(value);

    let disposition = head.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-disposition")
            .then_some(value)
    })?;

    let mut name = None;
    for param in disposition.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => name = Some(value.trim().trim_matches('"').to_string()),
            "filename" => return None,
            _ => {}
        }
    }

    Some((name?, String::from_utf8_lossy(value).into_owned()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode `+` and `%XX` escapes, replacing invalid UTF-8.
fn percent_decode(input: &[u8]) -> String {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match (input.get(i + 1).and_then(hex), input.get(i + 2).and_then(hex)) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(digit: &u8) -> Option<u8> {
    char::from(*digit).to_digit(16).map(|value| value as u8)
}
