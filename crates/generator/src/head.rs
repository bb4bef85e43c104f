use docpress_core::HeadTags;

/// Inline script that applies the saved or preferred color scheme before
/// first paint.
pub fn theme_script(appearance_key: &str) -> String {
    // A JSON string literal is a valid JavaScript string literal
    let key = serde_json::to_string(appearance_key).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"<script id="check-dark-mode">{{const saved=localStorage.getItem({});const preferDark=window.matchMedia('(prefers-color-scheme: dark)').matches;const isDark=!saved||saved==='auto'?preferDark:saved==='dark';document.documentElement.classList.toggle('dark',isDark);document.documentElement.style.colorScheme=isDark?'dark':'light';}}</script>"#,
        key.replace("</", "<\\/")
    )
}

/// Head section content: configured entries, then the tags collected during
/// rendering, then the theme bootstrap script.
pub fn assemble_head(configured: &[String], collected: &HeadTags, appearance_key: &str) -> String {
    let mut head = configured.concat();
    head.push_str(&collected.tags());
    head.push_str(&theme_script(appearance_key));
    head
}
