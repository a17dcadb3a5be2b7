#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $doc:ty, $error:ty, $doc_name_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[allow(dead_code)]
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $doc_name_snake>](&self, id: String) -> Result<Option<$doc>, $error> {
                    tracing::debug!("Sending request");
                    self.inner.get(id).await.map_err(<$error>::from)
                }

                #[allow(dead_code)]
                #[tracing::instrument(skip(self))]
                pub async fn [<delete_ $doc_name_snake>](&self, id: String) -> Result<(), $error> {
                    tracing::debug!("Sending request");
                    self.inner.delete(id).await.map_err(<$error>::from)
                }
            }
        }
    };
}
