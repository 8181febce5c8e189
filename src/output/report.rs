use super::OutputDocument;

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

pub fn render_html(doc: &OutputDocument) -> Vec<u8> {
    let json = serde_json::to_string(doc).unwrap_or_else(|_| "{}".to_string());
    let json = json_for_script_tag(&json);

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>EcoPack Recommendations</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms"></script>
  <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
  <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <style>
    body {{ font-family: 'Inter', sans-serif; }}
    .rank-gold {{ background: #ffc107; color: #1f2937; }}
    .rank-silver {{ background: #c0c0c0; color: #1f2937; }}
    .rank-bronze {{ background: #cd7f32; color: #fff; }}
    .rank-standard {{ background: #1f2937; color: #fff; }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <script type="application/json" id="report-data">{json}</script>
  <header class="border-b border-slate-200 bg-white px-8 py-4">
    <h2 class="text-xl font-bold uppercase tracking-tight">EcoPack Recommendations</h2>
  </header>
  <main class="max-w-[1200px] mx-auto w-full px-8 py-10">
    <div class="flex items-end justify-between mb-8">
      <div>
        <h1 class="text-4xl font-bold mb-2">RESULTS</h1>
        <p id="summary" class="text-slate-500 font-medium"></p>
      </div>
    </div>
    <div id="insight" class="hidden mb-8 rounded-xl border border-emerald-200 bg-emerald-50 p-5 text-emerald-900"></div>
    <div id="empty" class="hidden rounded-xl border border-slate-200 bg-white p-10 text-center text-slate-500"></div>
    <div id="table-wrap" class="overflow-x-auto rounded-2xl border border-slate-200 bg-white shadow-sm">
      <table class="w-full text-left text-sm">
        <thead class="bg-slate-100 text-xs uppercase text-slate-500">
          <tr>
            <th class="px-4 py-3">Rank</th>
            <th class="px-4 py-3">Material</th>
            <th class="px-4 py-3">Score</th>
            <th class="px-4 py-3">Cost</th>
            <th class="px-4 py-3">CO₂</th>
            <th class="px-4 py-3">Origin</th>
            <th class="px-4 py-3">Capacity</th>
          </tr>
        </thead>
        <tbody id="rows"></tbody>
      </table>
    </div>
    <div id="charts" class="grid grid-cols-1 md:grid-cols-2 gap-6 mt-10">
      <div class="rounded-2xl border border-slate-200 bg-white p-5"><canvas id="impactChart"></canvas></div>
      <div class="rounded-2xl border border-slate-200 bg-white p-5"><canvas id="sustainabilityChart"></canvas></div>
    </div>
  </main>
  <script>
    (function() {{
      function escapeHtml(value) {{
        return String(value == null ? '' : value)
          .replace(/&/g, '&amp;')
          .replace(/</g, '&lt;')
          .replace(/>/g, '&gt;')
          .replace(/"/g, '&quot;')
          .replace(/'/g, '&#39;');
      }}
      function cell(value) {{
        return value == null ? '<span class="text-slate-400">-</span>' : escapeHtml(value);
      }}

      const raw = document.getElementById('report-data').textContent || '{{}}';
      const doc = JSON.parse(raw);
      const records = doc.records || [];

      document.getElementById('summary').textContent =
        `${{doc.count}} result(s) from deployment "${{doc.deployment}}"`;

      if (doc.insight) {{
        const insight = document.getElementById('insight');
        insight.textContent = doc.insight;
        insight.classList.remove('hidden');
      }}

      if (records.length === 0) {{
        const empty = document.getElementById('empty');
        empty.textContent = doc.message || 'No materials found matching your requirements.';
        empty.classList.remove('hidden');
        document.getElementById('table-wrap').classList.add('hidden');
        document.getElementById('charts').classList.add('hidden');
        return;
      }}

      document.getElementById('rows').innerHTML = records.map(function(r) {{
        return `<tr class="border-t border-slate-100">
          <td class="px-4 py-3"><span class="inline-flex size-8 items-center justify-center rounded-full font-bold rank-${{r.tier}}">${{r.rank}}</span></td>
          <td class="px-4 py-3 font-semibold">${{cell(r.material)}}${{r.description ? `<div class="text-xs text-slate-500">${{escapeHtml(r.description)}}</div>` : ''}}</td>
          <td class="px-4 py-3">${{cell(r.score_display)}}</td>
          <td class="px-4 py-3">${{cell(r.cost_display)}}</td>
          <td class="px-4 py-3">${{cell(r.co2_display)}}</td>
          <td class="px-4 py-3">${{cell(r.origin)}}</td>
          <td class="px-4 py-3">${{r.weight_capacity == null ? cell(null) : escapeHtml(r.weight_capacity) + ' kg'}}</td>
        </tr>`;
      }}).join('');

      const chart = doc.chart || {{}};
      new Chart(document.getElementById('impactChart'), {{
        type: 'bar',
        data: {{
          labels: chart.labels,
          datasets: [
            {{ label: 'Cost', data: chart.cost, backgroundColor: '#f59e0b' }},
            {{ label: 'CO₂', data: chart.co2, backgroundColor: '#ef4444' }}
          ]
        }}
      }});
      if (chart.mean_biodegradability != null || chart.mean_recyclability != null) {{
        new Chart(document.getElementById('sustainabilityChart'), {{
          type: 'bar',
          data: {{
            labels: ['Biodegradability', 'Recyclability'],
            datasets: [{{
              label: 'Mean across results',
              data: [chart.mean_biodegradability, chart.mean_recyclability],
              backgroundColor: '#10b981'
            }}]
          }},
          options: {{ scales: {{ y: {{ min: 0, max: 100 }} }} }}
        }});
      }}
    }})();
  </script>
</body>
</html>
"####
    );

    html.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::DisplayOptions;
    use crate::normalize::{RecommendationResponse, RecommendationResult};

    #[test]
    fn script_tag_payload_cannot_close_the_tag() {
        let response = RecommendationResponse {
            recommendations: vec![RecommendationResult {
                material: Some("</script><b>".to_string()),
                ..RecommendationResult::default()
            }],
            ..RecommendationResponse::default()
        };
        let doc = super::super::build_document("recommend", &response, &DisplayOptions::default());
        let html = String::from_utf8(render_html(&doc)).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains(r#"<\/script><b>"#));
    }
}
