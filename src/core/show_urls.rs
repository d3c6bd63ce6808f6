//! Route listing command

use crate::{
    app::{Application, Route},
    cli::{args::ParsedArgs, command::Command, option::CommandOption},
    error::{Result, ScriptError},
};
use std::{
    fmt,
    io::{self, Write},
    str::FromStr,
};
use tracing::instrument;

/// Route attribute the listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteOrder {
    #[default]
    Rule,
    Endpoint,
    Methods,
}

impl RouteOrder {
    pub const ALL: [Self; 3] = [Self::Rule, Self::Endpoint, Self::Methods];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Endpoint => "endpoint",
            Self::Methods => "methods",
        }
    }

    /// Sort key of `route` under this order
    pub fn key(self, route: &Route) -> String {
        match self {
            Self::Rule => route.rule.clone(),
            Self::Endpoint => route.endpoint.clone(),
            Self::Methods => route.methods.join(","),
        }
    }
}

impl FromStr for RouteOrder {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                ScriptError::unknown_sort_key(s, Self::ALL.iter().map(|o| o.as_str()).collect())
            })
    }
}

impl fmt::Display for RouteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Displays all of the url matching routes for the project
#[derive(Debug, Clone, Default)]
pub struct ShowUrls {
    order: RouteOrder,
    extra_options: Vec<CommandOption>,
}

impl ShowUrls {
    pub fn new(order: RouteOrder) -> Self {
        Self {
            order,
            extra_options: Vec::new(),
        }
    }

    /// Add an option listed before `--order`
    pub fn add_option(&mut self, option: CommandOption) {
        self.extra_options.push(option);
    }

    /// Write the sorted route table to `out`
    pub fn write_routes<W: Write>(
        &self,
        mut routes: Vec<Route>,
        order: RouteOrder,
        out: &mut W,
    ) -> Result<()> {
        routes.sort_by_cached_key(|route| order.key(route));

        writeln!(out, "{:<30} Endpoint", "Rule")?;
        writeln!(out, "{}", "-".repeat(80))?;
        for route in &routes {
            writeln!(out, "{:<30} {}", route.rule, route.endpoint)?;
        }
        Ok(())
    }
}

impl Command for ShowUrls {
    fn doc(&self) -> Option<&str> {
        Some(
            "
        Displays all of the url matching routes for the project.
    ",
        )
    }

    fn options(&self) -> Vec<CommandOption> {
        let mut options = self.extra_options.clone();
        options.push(
            CommandOption::new(["--order"])
                .dest("order")
                .default_value(self.order)
                .help(format!(
                    "Property on Route to order by (default: {})",
                    self.order
                )),
        );
        options
    }

    #[instrument(skip_all, fields(app = app.name()))]
    fn run(&self, app: &dyn Application, args: &ParsedArgs) -> Result<()> {
        let order = match args.string("order")? {
            Some(order) => order.parse()?,
            None => self.order,
        };
        self.write_routes(app.routes(), order, &mut io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StaticApp;

    fn render(order: RouteOrder, routes: Vec<Route>) -> String {
        let mut out = Vec::new();
        ShowUrls::default()
            .write_routes(routes, order, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_routes_sorted_by_rule() {
        let routes = vec![
            Route::new("/a", "alpha"),
            Route::new("/c", "charlie"),
            Route::new("/b", "bravo"),
        ];
        let output = render(RouteOrder::default(), routes);
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], format!("{:<30} Endpoint", "Rule"));
        assert_eq!(lines[1], "-".repeat(80));
        let rules: Vec<_> = lines[2..]
            .iter()
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(rules, ["/a", "/b", "/c"]);
        assert_eq!(lines[2], format!("{:<30} alpha", "/a"));
    }

    #[test]
    fn test_routes_sorted_by_endpoint() {
        let routes = vec![Route::new("/z", "alpha"), Route::new("/a", "zulu")];
        let output = render(RouteOrder::Endpoint, routes);
        let rows: Vec<_> = output.lines().skip(2).collect();
        assert!(rows[0].ends_with("alpha"));
        assert!(rows[1].ends_with("zulu"));
    }

    #[test]
    fn test_unknown_order_rejected() {
        let error = "methodz".parse::<RouteOrder>().unwrap_err();
        match error {
            ScriptError::UnknownSortKey { key, allowed } => {
                assert_eq!(key, "methodz");
                assert_eq!(allowed, ["rule", "endpoint", "methods"]);
            }
            other => panic!("Expected UnknownSortKey, got {other:?}"),
        }
    }

    #[test]
    fn test_order_option_merged_after_extra_options() {
        let mut command = ShowUrls::new(RouteOrder::Endpoint);
        command.add_option(CommandOption::new(["--verbose"]));

        let options = command.options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].get_dest(), "order");
        assert_eq!(options[1].get_default(), Some("endpoint"));
        assert_eq!(
            options[1].get_help(),
            Some("Property on Route to order by (default: endpoint)")
        );
    }

    #[test]
    fn test_run_with_unknown_order_fails() {
        let command = ShowUrls::default();
        let matches = command
            .create_parser("urls")
            .try_get_matches_from(["urls", "--order", "nope"])
            .unwrap();
        let result = command.handle(&StaticApp::demo(), &ParsedArgs::new(matches));
        assert!(matches!(result, Err(ScriptError::UnknownSortKey { .. })));
    }

    #[test]
    fn test_description_trimmed() {
        assert_eq!(
            ShowUrls::default().description(),
            "Displays all of the url matching routes for the project."
        );
    }
}
