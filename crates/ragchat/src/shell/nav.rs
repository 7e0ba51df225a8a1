/// An external link shown in the navigation bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    /// Display label.
    pub label: &'static str,
    /// Destination URL.
    pub href: String,
}

/// Returns the navigation links, in display order.
///
/// The last one points at the interactive API docs of the backend at
/// `api_url`.
pub fn nav_links(api_url: &str) -> Vec<NavLink> {
    vec![
        NavLink {
            label: "The Muslim Lantern",
            href: "https://www.youtube.com/@themuslimlantern".to_owned(),
        },
        NavLink {
            label: "Developer",
            href: "https://github.com/mohammaduwaish".to_owned(),
        },
        NavLink {
            label: "API Docs",
            href: format!("{}/docs", api_url.trim_end_matches('/')),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_docs_follow_base_url() {
        let links = nav_links("http://localhost:8000");
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].label, "API Docs");
        assert_eq!(links[2].href, "http://localhost:8000/docs");

        let links = nav_links("https://rag.example.com/");
        assert_eq!(links[2].href, "https://rag.example.com/docs");
    }
}
