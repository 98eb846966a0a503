// Challenge page served at `/`. The stage plan travels as embedded JSON for the
// browser-side runtime to pick up.

use serde::Serialize;

use crate::challenge::types::StagePlan;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PagePlan {
    pub challenge_id: String,
    pub resource: Option<String>,
    pub display_name: Option<String>,
    pub confidence_threshold: u32,
    pub transition_cooldown_ms: u64,
    pub stages: Vec<StagePlan>,
}

pub fn html_escape(text: &str) -> String {
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

// Keeps the JSON from closing the surrounding <script> element
fn script_safe_json(plan: &PagePlan) -> Result<String> {
    Ok(serde_json::to_string(plan)?.replace("</", "<\\/"))
}

pub fn render_page(plan: &PagePlan) -> Result<String> {
    let title = match &plan.display_name {
        Some(name) => format!("Unlock {}", html_escape(name)),
        None => "Gesture challenge".to_string(),
    };

    let stages: String = plan
        .stages
        .iter()
        .enumerate()
        .map(|(i, stage)| {
            format!(
                "      <li class=\"stage\" data-kind=\"{kind}\"><img src=\"{image}\" alt=\"{kind}\"><span>{n}. {text}</span></li>\n",
                kind = stage.kind,
                image = html_escape(&stage.image),
                n = i + 1,
                text = html_escape(&stage.instruction),
            )
        })
        .collect();

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body>
    <h1>{title}</h1>
    <p>Perform each gesture in order and hold it until the stage turns green.</p>
    <ol id="stages">
{stages}    </ol>
    <video id="camera" autoplay playsinline muted></video>
    <script type="application/json" id="challenge-plan">{plan}</script>
    <script>
      window.challengePlan = JSON.parse(document.getElementById("challenge-plan").textContent);
      window.completeChallenge = function (completed) {{
        return fetch("/complete", {{
          method: "POST",
          headers: {{ "Content-Type": "application/json" }},
          body: JSON.stringify({{
            completed: completed !== false,
            timestamp: new Date().toISOString(),
            resource: window.challengePlan.resource,
            challenge_id: window.challengePlan.challenge_id
          }})
        }});
      }};
    </script>
  </body>
</html>
"#,
        title = title,
        stages = stages,
        plan = script_safe_json(plan)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::types::GestureKind;

    fn plan(display_name: Option<&str>) -> PagePlan {
        PagePlan {
            challenge_id: "abc".into(),
            resource: Some("doc-1".into()),
            display_name: display_name.map(String::from),
            confidence_threshold: 5,
            transition_cooldown_ms: 2000,
            stages: vec![
                StagePlan::for_kind(GestureKind::FingerToLip),
                StagePlan::for_kind(GestureKind::OscillatingHands),
            ],
        }
    }

    #[test]
    fn page_lists_stages_in_order() {
        let html = render_page(&plan(None)).unwrap();
        let lip = html.find("data-kind=\"finger-to-lip\"").unwrap();
        let hands = html.find("data-kind=\"oscillating-hands\"").unwrap();
        assert!(lip < hands);
        assert!(html.contains("/assets/finger_to_lip.jpg"));
        assert!(html.contains("\"confidence_threshold\":5"));
    }

    #[test]
    fn display_name_cannot_break_out() {
        let html = render_page(&plan(Some("</script><b>x"))).unwrap();
        assert!(html.contains("Unlock &lt;/script&gt;&lt;b&gt;x"));
        assert_eq!(html.matches("</script>").count(), 2);
    }
}
