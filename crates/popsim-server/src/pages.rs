//! Server-rendered HTML for the configuration form and the result page.

use crate::form::{
    count_field, interaction_field, rate_field, region_field, select_field, FormFields,
    ACTION_CONFIGURE, ACTION_RUN,
};
use popsim_core::{Color, Region};

const STYLE: &str = r#"
    body { font-family: sans-serif; margin: 2em; background-color: #f9f9f9; }
    form { background-color: #fff; padding: 2em; border-radius: 8px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }
    fieldset { border: 1px solid #ccc; border-radius: 5px; margin-bottom: 1em; padding: 1em; }
    legend { font-weight: bold; color: #0056b3; }
    small { color: #666; margin-left: 10px; }
    input[type=number], select { width: 100px; margin-bottom: 0.5em; padding: 5px; }
    button { padding: 10px 20px; font-size: 1.1em; background-color: #007bff; color: white; border: none; border-radius: 5px; cursor: pointer; margin-top: 10px; }
    .error { color: red; font-weight: bold; margin-top: 1em; }
"#;

/// Escape text for use in element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn echoed(fields: &FormFields, key: &str) -> String {
    escape(fields.get(key).map(String::as_str).unwrap_or(""))
}

/// Configuration page. With an empty `selected` only step 1 is shown;
/// otherwise the interaction grid and run parameters follow.
pub fn config_page(fields: &FormFields, selected: &[Color], error: Option<&str>) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Population Simulation</title>\n<style>{}</style>\n</head>\n<body>\n\
         <h2>Population Simulation - Setup</h2>\n<form method=\"post\">\n",
        STYLE
    ));

    html.push_str(
        "<fieldset>\n<legend>Step 1: Select populations</legend>\n\
         <p>Tick the populations to simulate and set their initial parameters.</p>\n",
    );
    for color in Color::ALL {
        let checked = if selected.contains(&color) { " checked" } else { "" };
        html.push_str(&format!(
            "<div>\n<input type=\"checkbox\" name=\"{select}\"{checked}>\n<label><b>{color}</b></label>\n\
             Initial count: <input type=\"number\" name=\"{count}\" min=\"1\" max=\"1000\" placeholder=\"100\" value=\"{count_value}\"> <small>(1 to 1000)</small>\n\
             Reproduction rate: <input type=\"number\" step=\"0.01\" name=\"{rate}\" min=\"0\" max=\"1\" placeholder=\"0.1\" value=\"{rate_value}\"> <small>(0 to 1)</small>\n\
             Region: <select name=\"{region}\">\n",
            select = select_field(color),
            count = count_field(color),
            count_value = echoed(fields, &count_field(color)),
            rate = rate_field(color),
            rate_value = echoed(fields, &rate_field(color)),
            region = region_field(color),
        ));
        let chosen = fields.get(&region_field(color)).map(String::as_str);
        for region in Region::ALL {
            let is_chosen = if chosen == Some(region.label()) { " selected" } else { "" };
            html.push_str(&format!("<option value=\"{region}\"{is_chosen}>{region}</option>\n"));
        }
        html.push_str("</select>\n</div>\n");
    }
    html.push_str("</fieldset>\n");

    if selected.is_empty() {
        html.push_str(&format!(
            "<button type=\"submit\" name=\"action\" value=\"{}\">Configure interactions and parameters</button>\n",
            ACTION_CONFIGURE
        ));
    } else {
        html.push_str(
            "<fieldset>\n<legend>Step 2: Interactions between selected populations</legend>\n\
             <label>Chance (0 to 1) that one population eliminates another in the same region:</label><br>\n",
        );
        for &attacker in selected {
            for &victim in selected {
                if attacker == victim {
                    continue;
                }
                let name = interaction_field(attacker, victim);
                html.push_str(&format!(
                    "{attacker} eliminates {victim}: <input type=\"number\" step=\"0.01\" name=\"{name}\" min=\"0\" max=\"1\" placeholder=\"0\" value=\"{value}\"><br>\n",
                    value = echoed(fields, &name),
                ));
            }
        }
        html.push_str("</fieldset>\n");

        html.push_str(
            "<fieldset>\n<legend>Step 3: Simulation parameters</legend>\n\
             Combination chance in the same region: <input type=\"number\" step=\"0.01\" name=\"combine_same_region\" min=\"0\" max=\"1\" required> <small>(0 to 1)</small><br>\n\
             Combination chance across regions: <input type=\"number\" step=\"0.01\" name=\"combine_cross_region\" min=\"0\" max=\"1\" required> <small>(0 to 1)</small><br>\n\
             Random mutation chance: <input type=\"number\" step=\"0.01\" name=\"mutation_chance\" min=\"0\" max=\"1\" required> <small>(0 to 1)</small><br><br>\n\
             Generations to simulate: <input type=\"number\" name=\"generations\" min=\"1\" max=\"50\" required> <small>(at most 50)</small><br>\n\
             Seed: <input type=\"number\" name=\"seed\" min=\"0\"> <small>(optional, for reproducible runs)</small><br>\n\
             </fieldset>\n",
        );
        html.push_str(&format!(
            "<button type=\"submit\" name=\"action\" value=\"{}\">Run simulation</button>\n",
            ACTION_RUN
        ));
    }

    if let Some(error) = error {
        html.push_str(&format!("<p class=\"error\">ERROR: {}</p>\n", escape(error)));
    }

    html.push_str("</form>\n</body>\n</html>\n");
    html
}

/// Result page showing the run log verbatim
pub fn result_page(log_text: &str, seed: u64) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Simulation Result</title>\n</head>\n<body>\n<h2>Simulation Result</h2>\n\
         <p><small>Seed: {seed}</small></p>\n\
         <pre style=\"background-color:#f4f4f4; border: 1px solid #ccc; padding: 1em; white-space: pre-wrap; word-wrap: break-word;\">{log}</pre>\n\
         <a href=\"/\">Back to setup</a>\n</body>\n</html>\n",
        seed = seed,
        log = escape(log_text),
    )
}
