//! VPC with public and private subnets across two availability zones and a
//! single NAT gateway for private egress.

use efsml_common::Resource;
use efsml_common::intrinsic::{get_att, get_azs, reference, select};
use serde_json::{Value, json};

use crate::domain::error::StackError;
use crate::domain::stack::StackScope;

pub const VPC_CIDR: &str = "10.0.0.0/16";
pub const MAX_AZS: usize = 2;
pub const NAT_GATEWAYS: usize = 1;

/// Logical ids of the network resources other constructs reference.
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc: String,
    pub public_subnets: Vec<String>,
    pub private_subnets: Vec<String>,
    pub nat_gateways: Vec<String>,
}

impl Network {
    /// `[{"Ref": subnet}, ...]` for the private subnets.
    #[must_use]
    pub fn private_subnet_refs(&self) -> Value {
        Value::Array(self.private_subnets.iter().map(|s| reference(s)).collect())
    }
}

#[derive(Clone, Copy)]
enum SubnetKind {
    Public,
    Private,
}

impl SubnetKind {
    fn label(self) -> &'static str {
        match self {
            SubnetKind::Public => "Public",
            SubnetKind::Private => "Private",
        }
    }
}

/// The `/18` block for the n-th subnet; public subnets come first.
fn subnet_cidr(index: usize) -> String {
    format!("10.0.{}.0/18", index * 64)
}

/// Declare the VPC construct `{prefix}-{stage}-Vpc`.
///
/// # Errors
///
/// Returns an error if a derived logical id collides.
pub fn declare(scope: &mut StackScope) -> Result<Network, StackError> {
    let construct = scope.name("Vpc");
    let c = construct.as_str();

    let vpc = scope.add(
        &[c, "Resource"],
        Resource::new("AWS::EC2::VPC")
            .with_property("CidrBlock", json!(VPC_CIDR))
            .with_property("EnableDnsHostnames", json!(true))
            .with_property("EnableDnsSupport", json!(true))
            .with_property("InstanceTenancy", json!("default"))
            .with_property("Tags", name_tag(&scope.path_label(&[c]))),
    )?;

    let igw = scope.add(
        &[c, "IGW"],
        Resource::new("AWS::EC2::InternetGateway")
            .with_property("Tags", name_tag(&scope.path_label(&[c]))),
    )?;
    let attachment = scope.add(
        &[c, "VPCGW"],
        Resource::new("AWS::EC2::VPCGatewayAttachment")
            .with_property("VpcId", reference(&vpc))
            .with_property("InternetGatewayId", reference(&igw)),
    )?;

    let mut public_subnets = Vec::with_capacity(MAX_AZS);
    let mut nat_gateways = Vec::with_capacity(NAT_GATEWAYS);
    for az in 0..MAX_AZS {
        let name = format!("PublicSubnet{}", az + 1);
        let subnet = declare_subnet(scope, c, &name, SubnetKind::Public, az, &vpc)?;

        let route_table = subnet_route_table(scope, c, &name, &vpc, &subnet)?;
        scope.add(
            &[c, &name, "DefaultRoute"],
            Resource::new("AWS::EC2::Route")
                .with_property("RouteTableId", reference(&route_table))
                .with_property("DestinationCidrBlock", json!("0.0.0.0/0"))
                .with_property("GatewayId", reference(&igw))
                .with_dependency(&attachment),
        )?;

        if az < NAT_GATEWAYS {
            let tags = name_tag(&scope.path_label(&[c, &name]));
            let eip = scope.add(
                &[c, &name, "EIP"],
                Resource::new("AWS::EC2::EIP")
                    .with_property("Domain", json!("vpc"))
                    .with_property("Tags", tags.clone()),
            )?;
            let nat = scope.add(
                &[c, &name, "NATGateway"],
                Resource::new("AWS::EC2::NatGateway")
                    .with_property("AllocationId", get_att(&eip, "AllocationId"))
                    .with_property("SubnetId", reference(&subnet))
                    .with_property("Tags", tags),
            )?;
            nat_gateways.push(nat);
        }
        public_subnets.push(subnet);
    }

    let mut private_subnets = Vec::with_capacity(MAX_AZS);
    for az in 0..MAX_AZS {
        let name = format!("PrivateSubnet{}", az + 1);
        let subnet = declare_subnet(scope, c, &name, SubnetKind::Private, az, &vpc)?;
        let route_table = subnet_route_table(scope, c, &name, &vpc, &subnet)?;
        scope.add(
            &[c, &name, "DefaultRoute"],
            Resource::new("AWS::EC2::Route")
                .with_property("RouteTableId", reference(&route_table))
                .with_property("DestinationCidrBlock", json!("0.0.0.0/0"))
                .with_property("NatGatewayId", reference(&nat_gateways[az % nat_gateways.len()])),
        )?;
        private_subnets.push(subnet);
    }

    Ok(Network {
        vpc,
        public_subnets,
        private_subnets,
        nat_gateways,
    })
}

fn declare_subnet(
    scope: &mut StackScope,
    construct: &str,
    name: &str,
    kind: SubnetKind,
    az: usize,
    vpc: &str,
) -> Result<String, StackError> {
    let index = match kind {
        SubnetKind::Public => az,
        SubnetKind::Private => MAX_AZS + az,
    };
    let mut tags = name_tag(&scope.path_label(&[construct, name]));
    if let Value::Array(items) = &mut tags {
        items.push(json!({ "Key": "aws-cdk:subnet-name", "Value": kind.label() }));
        items.push(json!({ "Key": "aws-cdk:subnet-type", "Value": kind.label() }));
    }
    scope.add(
        &[construct, name, "Subnet"],
        Resource::new("AWS::EC2::Subnet")
            .with_property("CidrBlock", json!(subnet_cidr(index)))
            .with_property("VpcId", reference(vpc))
            .with_property("AvailabilityZone", select(az, get_azs()))
            .with_property(
                "MapPublicIpOnLaunch",
                json!(matches!(kind, SubnetKind::Public)),
            )
            .with_property("Tags", tags),
    )
}

fn subnet_route_table(
    scope: &mut StackScope,
    construct: &str,
    name: &str,
    vpc: &str,
    subnet: &str,
) -> Result<String, StackError> {
    let route_table = scope.add(
        &[construct, name, "RouteTable"],
        Resource::new("AWS::EC2::RouteTable")
            .with_property("VpcId", reference(vpc))
            .with_property("Tags", name_tag(&scope.path_label(&[construct, name]))),
    )?;
    scope.add(
        &[construct, name, "RouteTableAssociation"],
        Resource::new("AWS::EC2::SubnetRouteTableAssociation")
            .with_property("RouteTableId", reference(&route_table))
            .with_property("SubnetId", reference(subnet)),
    )?;
    Ok(route_table)
}

/// `[{"Key": "Name", "Value": label}]`
#[must_use]
pub fn name_tag(label: &str) -> Value {
    json!([{ "Key": "Name", "Value": label }])
}
