// SPDX-License-Identifier: PMPL-1.0-or-later
//! Self-contained HTML report in French.
//!
//! Inline stylesheet and a small accordion script, no external assets.
//! Every interpolated string goes through [`escape_html`].

use super::{escape_html, impact_label, page_label, translate_hint, ReportModel};
use crate::aggregate::{CriterionStatus, CriterionSummary};
use crate::finding::Finding;

const STYLE: &str = r#"
    :root {
      --primary-color: #0063cb;
      --secondary-color: #000091;
      --success-color: #18753c;
      --warning-color: #b34000;
      --danger-color: #ce0500;
      --light-color: #f6f6f6;
      --text-color: #1e1e1e;
      --border-color: #ddd;
    }
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: 'Marianne', system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif;
      line-height: 1.5;
      color: var(--text-color);
    }
    .container { max-width: 1200px; margin: 0 auto; padding: 0 1rem; }
    header { background-color: var(--primary-color); color: white; padding: 1.5rem 0; margin-bottom: 2rem; }
    h1, h2, h3, h4 { margin-bottom: 1rem; font-weight: 700; }
    h1 { font-size: 2rem; }
    h2 { font-size: 1.5rem; margin-top: 2rem; border-bottom: 2px solid var(--primary-color); padding-bottom: 0.5rem; }
    h3 { font-size: 1.25rem; margin-top: 1.5rem; }
    p { margin-bottom: 1rem; }
    .summary { background-color: var(--light-color); padding: 1.5rem; border-radius: 4px; margin-bottom: 2rem; }
    .stats { display: flex; flex-wrap: wrap; gap: 1rem; margin-bottom: 1.5rem; }
    .stat-card { flex: 1; min-width: 200px; background-color: white; border-radius: 4px; padding: 1rem; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1); }
    .stat-card h3 { margin-top: 0; font-size: 1rem; }
    .stat-value { font-size: 2rem; font-weight: bold; margin: 0.5rem 0; }
    .success { color: var(--success-color); }
    .warning { color: var(--warning-color); }
    .danger { color: var(--danger-color); }
    .alert { border-left: 4px solid var(--warning-color); background-color: #fff4e5; padding: 1rem; margin-bottom: 2rem; }
    .badge { display: inline-block; padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.875rem; font-weight: 600; }
    .badge-success { background-color: #e3f5ec; color: var(--success-color); }
    .badge-danger { background-color: #ffeae9; color: var(--danger-color); }
    .badge-secondary { background-color: #f6f6f6; color: #666; }
    .accordion { margin-bottom: 1rem; border: 1px solid var(--border-color); border-radius: 4px; }
    .accordion-header {
      width: 100%; padding: 1rem; background-color: var(--light-color); border: none; font: inherit;
      text-align: left; cursor: pointer; display: flex; justify-content: space-between; align-items: center;
    }
    .accordion-content { padding: 1rem; display: none; }
    .accordion-content.active { display: block; }
    .violation-item { margin-bottom: 1rem; padding-bottom: 1rem; border-bottom: 1px solid var(--border-color); }
    .violation-item:last-child { border-bottom: none; }
    .violation-target { font-family: monospace; background-color: #f6f6f6; padding: 0.5rem; margin: 0.5rem 0; border-radius: 4px; overflow-x: auto; white-space: pre-wrap; }
    .url-list { margin: 0 0 1.5rem 1.5rem; }
    footer { margin-top: 3rem; padding: 1.5rem 0; background-color: var(--light-color); text-align: center; font-size: 0.875rem; color: #666; }
    @media (max-width: 768px) { .stats { flex-direction: column; } }
    .toggle-icon::before { content: '+'; display: inline-block; width: 20px; text-align: center; }
    .accordion-header[aria-expanded="true"] .toggle-icon::before { content: '-'; }
"#;

const SCRIPT: &str = r#"
    document.addEventListener('DOMContentLoaded', function () {
      document.querySelectorAll('.accordion-header').forEach(function (header) {
        header.addEventListener('click', function () {
          var expanded = this.getAttribute('aria-expanded') === 'true';
          this.setAttribute('aria-expanded', String(!expanded));
          this.nextElementSibling.classList.toggle('active');
        });
      });
    });
"#;

pub(crate) fn render_html(model: &ReportModel<'_>) -> String {
    let title = escape_html(&model.meta.title);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("  <title>{}</title>\n", title));
    html.push_str(&format!("  <style>{}</style>\n", STYLE));
    html.push_str("</head>\n<body>\n");

    html.push_str("  <header>\n    <div class=\"container\">\n");
    html.push_str(&format!("      <h1>{}</h1>\n", title));
    html.push_str(&format!(
        "      <p>Généré le {}</p>\n",
        escape_html(&model.meta.date_label())
    ));
    html.push_str("    </div>\n  </header>\n\n");

    html.push_str("  <main class=\"container\">\n");
    push_warnings(&mut html, model);
    push_summary(&mut html, model);

    html.push_str("    <section>\n      <h2>Résultats par critère RGAA</h2>\n");
    for category in &model.aggregate.categories {
        html.push_str(&format!("      <h3>{}</h3>\n", escape_html(&category.category)));
        for criterion in &category.criteria {
            push_criterion(&mut html, model, criterion);
        }
    }
    html.push_str("    </section>\n  </main>\n\n");

    html.push_str("  <footer>\n    <div class=\"container\">\n");
    html.push_str(&format!(
        "      <p>Rapport généré par rgaabot {} avec axe-core</p>\n",
        env!("CARGO_PKG_VERSION")
    ));
    html.push_str("    </div>\n  </footer>\n");
    html.push_str(&format!("  <script>{}</script>\n", SCRIPT));
    html.push_str("</body>\n</html>\n");

    html
}

fn push_warnings(html: &mut String, model: &ReportModel<'_>) {
    let failed = model.failed_pages();

    if model.aggregate.degraded {
        html.push_str(
            "    <div class=\"alert\" role=\"alert\">\n      <p><strong>Attention :</strong> \
             aucune page n'a pu être évaluée. Tous les critères sont marqués non testés ; \
             ce rapport ne permet pas de conclure à la conformité.</p>\n",
        );
    } else if !failed.is_empty() {
        html.push_str(&format!(
            "    <div class=\"alert\" role=\"alert\">\n      <p><strong>Attention :</strong> \
             {} page(s) sur {} n'ont pas pu être évaluées. Les résultats ci-dessous sont partiels.</p>\n",
            failed.len(),
            model.aggregate.stats.pages
        ));
    } else {
        return;
    }

    if !failed.is_empty() {
        html.push_str("      <ul class=\"url-list\">\n");
        for page in failed {
            html.push_str(&format!(
                "        <li>{} : {}</li>\n",
                escape_html(&page.page_id),
                escape_html(page.error.as_deref().unwrap_or("erreur inconnue"))
            ));
        }
        html.push_str("      </ul>\n");
    }
    html.push_str("    </div>\n");
}

fn conformity_class(percentage: u32) -> &'static str {
    if percentage >= 75 {
        "success"
    } else if percentage >= 50 {
        "warning"
    } else {
        "danger"
    }
}

fn push_summary(html: &mut String, model: &ReportModel<'_>) {
    let stats = &model.aggregate.stats;

    html.push_str("    <section class=\"summary\">\n      <h2>Résumé</h2>\n      <div class=\"stats\">\n");
    push_card(
        html,
        "Critères testés",
        &stats.tested.to_string(),
        "",
        &format!("sur {} critères RGAA", stats.total_criteria),
    );
    push_card(
        html,
        "Conformité globale",
        &format!("{}%", stats.conformity_percentage),
        conformity_class(stats.conformity_percentage),
        &format!("{} critères conformes", stats.conformant),
    );
    push_card(
        html,
        "Pages testées",
        &stats.pages_evaluated.to_string(),
        "",
        &format!("sur {} demandée(s)", stats.pages),
    );
    push_card(
        html,
        "Violations",
        &stats.total_violations.to_string(),
        "danger",
        "problèmes détectés",
    );
    html.push_str("      </div>\n");

    html.push_str("      <h3>Pages analysées</h3>\n      <ul class=\"url-list\">\n");
    for id in &model.order {
        let escaped = escape_html(id);
        if id.starts_with("http://") || id.starts_with("https://") {
            html.push_str(&format!(
                "        <li><a href=\"{0}\" target=\"_blank\" rel=\"noopener\">{0}</a></li>\n",
                escaped
            ));
        } else {
            html.push_str(&format!("        <li>{}</li>\n", escaped));
        }
    }
    html.push_str("      </ul>\n    </section>\n\n");
}

fn push_card(html: &mut String, heading: &str, value: &str, class: &str, caption: &str) {
    html.push_str("        <div class=\"stat-card\">\n");
    html.push_str(&format!("          <h3>{}</h3>\n", heading));
    html.push_str(&format!(
        "          <div class=\"stat-value {}\">{}</div>\n",
        class, value
    ));
    html.push_str(&format!("          <p>{}</p>\n", escape_html(caption)));
    html.push_str("        </div>\n");
}

fn status_badge(status: CriterionStatus) -> &'static str {
    match status {
        CriterionStatus::Conformant => "badge-success",
        CriterionStatus::NonConformant => "badge-danger",
        CriterionStatus::Untested => "badge-secondary",
    }
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

fn push_criterion(html: &mut String, model: &ReportModel<'_>, criterion: &CriterionSummary) {
    html.push_str("      <div class=\"accordion\">\n");
    html.push_str("        <button type=\"button\" class=\"accordion-header\" aria-expanded=\"false\">\n");
    html.push_str(&format!(
        "          <span><strong>{}</strong> - {} <span class=\"badge {}\">{}</span>",
        escape_html(&criterion.criterion_id),
        escape_html(&criterion.description),
        status_badge(criterion.status),
        criterion.status.label()
    ));
    if criterion.violation_count > 0 {
        html.push_str(&format!(
            " <span class=\"badge badge-danger\">{} violation{}</span>",
            criterion.violation_count,
            plural(criterion.violation_count)
        ));
    }
    html.push_str("</span>\n          <span class=\"toggle-icon\" aria-hidden=\"true\"></span>\n");
    html.push_str("        </button>\n        <div class=\"accordion-content\">\n");

    if criterion.status == CriterionStatus::Untested {
        html.push_str(
            "          <p>Ce critère n'a pas été testé automatiquement. \
             Une vérification manuelle est recommandée.</p>\n",
        );
    } else {
        for page in model.order.iter().filter_map(|id| model.pages.get(id)) {
            let Some(result) = page.get(&criterion.criterion_id) else {
                continue;
            };
            if !result.tested {
                continue;
            }
            html.push_str(&format!(
                "          <h4>{}</h4>\n",
                escape_html(page_label(&page.page_id))
            ));
            let count = result.violations.len();
            if count == 0 {
                html.push_str(
                    "          <p><span class=\"badge badge-success\">Conforme</span> \
                     Aucune violation détectée</p>\n",
                );
                continue;
            }
            html.push_str(&format!(
                "          <p><span class=\"badge badge-danger\">Non conforme</span> \
                 {0} violation{1} détectée{1}</p>\n",
                count,
                plural(count)
            ));
            for violation in &result.violations {
                push_violation(html, violation);
            }
        }
    }

    html.push_str("        </div>\n      </div>\n");
}

fn push_violation(html: &mut String, violation: &Finding) {
    html.push_str("          <div class=\"violation-item\">\n");
    html.push_str(&format!(
        "            <p><strong>Règle :</strong> {} - {}</p>\n",
        escape_html(&violation.rule_id),
        escape_html(violation.help.as_deref().unwrap_or(""))
    ));
    html.push_str(&format!(
        "            <p><strong>Impact :</strong> {}</p>\n",
        impact_label(violation.impact)
    ));
    html.push_str("            <p><strong>Éléments concernés :</strong></p>\n");
    for target in &violation.targets {
        html.push_str(&format!(
            "            <div class=\"violation-target\">{}</div>\n",
            escape_html(&target.html)
        ));
        let suggestion = match &target.hint {
            Some(hint) => escape_html(&translate_hint(hint)),
            None => "Aucune suggestion disponible".to_string(),
        };
        html.push_str(&format!(
            "            <p><strong>Suggestion :</strong> {}</p>\n",
            suggestion
        ));
    }
    html.push_str("          </div>\n");
}
