/// Implements [Table](crate::database::Table) for a model.
///
/// ```ignore
/// define_table!("videos" : Video);
/// ```
#[macro_export]
macro_rules! define_table {
    ($table:literal : $model:ty) => {
        impl $crate::database::Table for $model {
            fn table() -> &'static str {
                $table
            }
        }
    };
}

/// Defines a method to query the database using SurrealQL.
///
/// # Syntax
/// ```text
/// [Base Type] > method_name(...arguments) > [Output Type] where "query"
/// ```
/// Where the `Base Type` is the type that the method is being defined for and the `Output Type` is the type that the method will return.
/// Every argument is bound under its own name, and the value of the last statement is returned.
///
/// # Example
///
/// ```ignore
/// define_relation! {
///     Comment > record(id: Record<Comment>) > Option<CommentRecord>
///         where "SELECT meta::id(id) AS id, meta::id(owner) AS owner FROM type::thing('comments', $id)"
/// }
///
/// let comment = Comment::record(comment_id, &db).await?;
/// ```
#[macro_export]
macro_rules! define_relation {
    ($model:ty > $relation:ident ($($binding:ident : $binding_type:ty),*) > $export:ty where $query:literal) => {
        impl $model {
            #[tracing::instrument(skip(db))]
            pub async fn $relation(
                $($binding : $binding_type ,)* db: &$crate::database::Database,
            ) -> ::std::result::Result<$export, $crate::database::DatabaseQueryError> {
                db.sql($query)
                    $(.bind((stringify!($binding), $binding)))*
                    .fetch_last()
                    .await
            }
        }
    };
}
