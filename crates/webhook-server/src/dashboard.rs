use axum::{extract::State, response::Html};

use crate::AppState;

/// Single-page dashboard polling `/status` and `/relays` every two seconds.
pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    Html(DASHBOARD_HTML.replace("{{symbol}}", &state.symbol))
}

const DASHBOARD_HTML: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <title>{{symbol}} Paper Trader Dashboard</title>
  <style>
    * { box-sizing: border-box; }
    body {
      margin: 0; padding: 16px;
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      background: #050509; color: #f5f5f5;
    }
    h1 { margin-top: 0; font-size: 24px; }
    .sub { color: #9a9a9a; font-size: 12px; margin-bottom: 12px; }
    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 16px; margin: 16px 0;
    }
    .card {
      background: #15151b; border-radius: 12px; padding: 16px;
      box-shadow: 0 0 12px rgba(0,0,0,0.45);
    }
    .label {
      font-size: 11px; text-transform: uppercase; letter-spacing: 0.08em;
      color: #9a9a9a; margin-bottom: 4px;
    }
    .value { font-size: 18px; }
    .pnl-pos { color: #2ecc71; }
    .pnl-neg { color: #e74c3c; }
    table { width: 100%; border-collapse: collapse; margin-top: 8px; font-size: 12px; }
    th, td { padding: 4px 6px; border-bottom: 1px solid #222; text-align: left; }
    th { font-weight: 600; color: #bbbbbb; }
    .relay-row {
      display: flex; align-items: center; justify-content: space-between;
      padding: 4px 0; border-bottom: 1px solid #222; font-size: 12px;
    }
    button {
      border-radius: 6px; border: 1px solid #444; background: #1f1f27;
      color: #f5f5f5; padding: 4px 8px; cursor: pointer; font-size: 12px;
    }
    button:hover { background: #2a2a34; }
    input[type="text"] {
      width: 100%; padding: 6px 8px; border-radius: 6px; border: 1px solid #444;
      background: #0b0b11; color: #f5f5f5; font-size: 12px; margin-bottom: 6px;
    }
    .small { font-size: 11px; color: #9a9a9a; margin-top: 4px; }
  </style>
</head>
<body>
  <h1>{{symbol}} Paper Trader</h1>
  <div class="sub">Dashboard &middot; FSM state, position, anchors, P&amp;L and relays</div>

  <div id="cards">Loading...</div>

  <div class="grid">
    <div class="card" style="grid-column: 1 / -1;">
      <div class="label">Trades</div>
      <div id="trades-table">No trades yet.</div>
    </div>

    <div class="card" style="grid-column: 1 / -1;">
      <div class="label">Relays</div>
      <div>
        <input id="relay-url" type="text" placeholder="https://your-endpoint.example.com/hook" />
        <button id="add-relay-btn">Add Relay</button>
        <div class="small">All incoming signals are forwarded to these URLs as JSON.</div>
      </div>
      <div id="relays-list" style="margin-top: 8px;">Loading relays...</div>
    </div>
  </div>

  <script>
    function fmt(n, digits) {
      if (n == null || Number.isNaN(n)) return "-";
      return Number(n).toFixed(digits ?? 2);
    }

    function pnlClass(v) {
      if (v > 0) return "pnl-pos";
      if (v < 0) return "pnl-neg";
      return "";
    }

    async function fetchStatus() {
      const res = await fetch('/status');
      return res.json();
    }

    async function fetchRelays() {
      const res = await fetch('/relays');
      return res.json();
    }

    async function relayRequest(method, url) {
      const res = await fetch('/relays', {
        method,
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ url })
      });
      return res.json();
    }

    function renderCards(data) {
      const root = document.getElementById('cards');
      const pnl = data.pnl || {};
      const pos = data.position || {};
      const anchors = data.anchors || {};

      root.innerHTML = `
        <div class="grid">
          <div class="card">
            <div class="label">FSM State</div>
            <div class="value">${data.state}</div>
          </div>

          <div class="card">
            <div class="label">Position</div>
            <div>Side: ${pos.side ?? '-'}</div>
            <div>Qty: ${pos.qty ?? 0}</div>
            <div>Entry Price: ${pos.entryPrice ?? '-'}</div>
          </div>

          <div class="card">
            <div class="label">Anchors</div>
            <div>Buy Trigger: ${anchors.buyEntryTrigger ?? '-'}</div>
            <div>Buy Stop: ${anchors.buyStop ?? '-'}</div>
            <div>Sell Trigger: ${anchors.sellEntryTrigger ?? '-'}</div>
            <div>Sell Stop: ${anchors.sellStop ?? '-'}</div>
          </div>

          <div class="card">
            <div class="label">P&amp;L</div>
            <div>Last Price: ${pnl.lastPrice ?? '-'}</div>
            <div class="${pnlClass(pnl.realizedPnl)}">Realized: ${fmt(pnl.realizedPnl)}</div>
            <div class="${pnlClass(pnl.unrealizedPnl)}">Unrealized: ${fmt(pnl.unrealizedPnl)}</div>
            <div class="${pnlClass(pnl.totalPnl)}">Total: ${fmt(pnl.totalPnl)}</div>
            <div>Trades: ${pnl.tradeCount ?? 0}</div>
          </div>
        </div>
      `;
    }

    function renderTrades(pnl) {
      const host = document.getElementById('trades-table');
      const trades = (pnl && pnl.trades) || [];
      if (!trades.length) {
        host.textContent = 'No trades yet.';
        return;
      }

      const rows = trades.slice().reverse().map(t => {
        const ts = new Date(t.ts).toLocaleString();
        const pnlTxt = t.pnl != null ? fmt(t.pnl) : '-';
        return `
          <tr>
            <td>${ts}</td>
            <td>${t.type}</td>
            <td>${t.side}</td>
            <td>${t.qty}</td>
            <td>${t.price}</td>
            <td class="${pnlClass(t.pnl || 0)}">${pnlTxt}</td>
          </tr>
        `;
      }).join('');

      host.innerHTML = `
        <table>
          <thead>
            <tr><th>Time</th><th>Type</th><th>Side</th><th>Qty</th><th>Price</th><th>P&amp;L</th></tr>
          </thead>
          <tbody>${rows}</tbody>
        </table>
      `;
    }

    function renderRelays(relayData) {
      const host = document.getElementById('relays-list');
      const list = (relayData && relayData.relays) || [];
      if (!list.length) {
        host.textContent = 'No relays registered.';
        return;
      }

      host.innerHTML = list.map(url => `
        <div class="relay-row">
          <div>${url}</div>
          <button data-url="${url}" class="remove-relay-btn">Remove</button>
        </div>
      `).join('');

      host.querySelectorAll('.remove-relay-btn').forEach(btn => {
        btn.addEventListener('click', async () => {
          await relayRequest('DELETE', btn.getAttribute('data-url'));
          renderRelays(await fetchRelays());
        });
      });
    }

    async function refreshAll() {
      try {
        const [status, relayData] = await Promise.all([fetchStatus(), fetchRelays()]);
        renderCards(status);
        renderTrades(status.pnl);
        renderRelays(relayData);
      } catch (e) {
        document.getElementById('cards').textContent = 'Error loading status: ' + e;
      }
    }

    document.addEventListener('DOMContentLoaded', () => {
      const btn = document.getElementById('add-relay-btn');
      const input = document.getElementById('relay-url');

      btn.addEventListener('click', async () => {
        const url = input.value.trim();
        if (!url) return;
        await relayRequest('POST', url);
        input.value = '';
        renderRelays(await fetchRelays());
      });

      refreshAll();
      setInterval(refreshAll, 2000);
    });
  </script>
</body>
</html>"#;
