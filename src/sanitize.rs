use lazy_static::lazy_static;
use scraper::{node::Node, Html, Selector};

const E: &str = "Invalid selector";
lazy_static! {
    static ref AD_ROW: Selector = Selector::parse("tr.s-table-body__row--ad").expect(E);
    static ref TWEET: Selector = Selector::parse("div.twitter-tweet").expect(E);
    static ref OVERLAYS: Selector = Selector::parse(
        "#divSatisfiChat, #transcend-consent-manager, #termly-code-snippet-support"
    )
    .expect(E);
}

const SKIP_AD: &str = "Skip Ad";

/// Strips ad rows, embedded tweets and overlays from an HTML fragment.
pub fn sanitize_html(html: &str) -> String {
    let mut fragment = Html::parse_fragment(html);
    strip(&mut fragment);
    fragment.root_element().inner_html()
}

/// Same as [`sanitize_html`] for a whole page, keeping the tree for further selection.
pub fn sanitize_document(html: &str) -> Html {
    let mut doc = Html::parse_document(html);
    strip(&mut doc);
    doc
}

fn strip(html: &mut Html) {
    let widgets = html
        .select(&AD_ROW)
        .chain(html.select(&TWEET))
        .chain(html.select(&OVERLAYS))
        .map(|el| el.id())
        .collect::<Vec<_>>();
    for id in widgets {
        if let Some(mut node) = html.tree.get_mut(id) {
            node.detach();
        }
    }

    // Text split around a removed widget serializes as one node, so it is
    // checked as one.
    merge_text_runs(html);

    let skip_ads = html
        .tree
        .nodes()
        .filter(|node| matches!(node.value(), Node::Text(text) if text.trim() == SKIP_AD))
        .map(|node| node.id())
        .collect::<Vec<_>>();
    for id in skip_ads {
        if let Some(mut node) = html.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn merge_text_runs(html: &mut Html) {
    let heads = html
        .tree
        .nodes()
        .filter(|node| node.value().is_text())
        .filter(|node| {
            !node
                .prev_sibling()
                .map(|prev| prev.value().is_text())
                .unwrap_or(false)
        })
        .map(|node| node.id())
        .collect::<Vec<_>>();

    for head in heads {
        loop {
            let (next, text) = match html.tree.get(head).and_then(|node| node.next_sibling()) {
                Some(next) => match next.value() {
                    Node::Text(text) => (next.id(), text.text.clone()),
                    _ => break,
                },
                None => break,
            };

            if let Some(mut node) = html.tree.get_mut(next) {
                node.detach();
            }
            if let Some(mut node) = html.tree.get_mut(head) {
                if let Node::Text(head_text) = node.value() {
                    head_text.text.push_tendril(&text);
                }
            }
        }
    }
}
