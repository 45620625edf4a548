//! Security utilities for Metadata API requests.
//!
//! Every user-provided value interpolated into a SOAP envelope MUST go through
//! [`xml::escape`]. Component names, labels and package names are all free
//! text from the caller's point of view.
//!
//! ```rust
//! use forcemeta_client::security::xml;
//!
//! let body = format!("<met:fullNames>{}</met:fullNames>", xml::escape("A&B__c"));
//! assert_eq!(body, "<met:fullNames>A&amp;B__c</met:fullNames>");
//! ```

/// XML escaping utilities.
pub mod xml {
    /// Escape a string for safe inclusion in XML content or attribute values.
    ///
    /// This escapes the five predefined XML entities.
    ///
    /// # Example
    ///
    /// ```rust
    /// use forcemeta_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Returns true if `name` can be used verbatim as an XML element name.
    ///
    /// Record field names become element names when a metadata record is
    /// serialized, so they are checked rather than escaped.
    #[must_use]
    pub fn is_valid_element_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }
}
