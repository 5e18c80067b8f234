//! Macro for inline Cypher queries.

/// Builds a Cypher [`Query`](crate::graph::Query) with named parameters.
///
/// ```ignore
/// use bibliofed::cypher;
///
/// let rows = cypher!(
///     client,
///     "MATCH (j:Journal) WHERE j.apc = $apc RETURN j.uri AS journal",
///     apc = true
/// )
/// .fetch_all()
/// .await?;
/// ```
#[macro_export]
macro_rules! cypher {
    ($graph:expr, $query:expr) => {
        $graph.query($query)
    };
    ($graph:expr, $query:expr, $($name:ident = $value:expr),+ $(,)?) => {
        $graph.query($query)$(.param(stringify!($name), $value))+
    };
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::graph::query::QueryExt;
    use crate::graph::row::{Params, RowStream};
    use crate::graph::traits::CypherExecutor;

    struct ParamEcho;

    #[async_trait::async_trait]
    impl CypherExecutor for ParamEcho {
        async fn execute_cypher(
            &self,
            _cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            let row = crate::graph::Row::new(params);
            Ok(Box::pin(futures::stream::iter(vec![Ok(row)])))
        }

        async fn run_cypher(&self, _cypher: &str, _params: Params) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cypher_macro_binds_named_params() {
        let executor = ParamEcho;
        let text = "ecology";

        let row = cypher!(
            executor,
            "MATCH (j:Journal) WHERE toLower(j.title) CONTAINS toLower($text) AND j.seal = $seal RETURN j.uri AS journal",
            text = text,
            seal = true,
        )
        .fetch_one()
        .await
        .unwrap()
        .unwrap();

        assert_eq!(row.text("text"), Some("ecology"));
        assert_eq!(row.get::<bool>("seal").unwrap(), true);
    }

    #[tokio::test]
    async fn test_cypher_macro_no_params() {
        let executor = ParamEcho;
        let row = cypher!(executor, "MATCH (j:Journal) RETURN j.uri AS journal")
            .fetch_one()
            .await
            .unwrap()
            .unwrap();
        assert!(row.is_empty());
    }
}
