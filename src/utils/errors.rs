use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertshipError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ACME error: {0}")]
    Acme(#[from] instant_acme::Error),

    #[error("Challenge error: {0}")]
    Challenge(String),

    #[error("DNS error: {0}")]
    Dns(String),

    #[error("Key/CSR generation error: {0}")]
    Csr(#[from] rcgen::Error),

    #[error("Certificate parsing error: {0}")]
    CertParsing(String),

    #[error("PEM error: {0}")]
    Pem(#[from] pem::PemError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    S3HeadBucket(
        #[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::head_bucket::HeadBucketError>,
    ),

    #[error(transparent)]
    S3PutObject(
        #[from] aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>,
    ),

    #[error(transparent)]
    Route53ListHostedZones(
        #[from]
        aws_sdk_route53::error::SdkError<
            aws_sdk_route53::operation::list_hosted_zones::ListHostedZonesError,
        >,
    ),

    #[error(transparent)]
    Route53ChangeRecordSets(
        #[from]
        aws_sdk_route53::error::SdkError<
            aws_sdk_route53::operation::change_resource_record_sets::ChangeResourceRecordSetsError,
        >,
    ),
}

pub type Result<T> = std::result::Result<T, CertshipError>;
